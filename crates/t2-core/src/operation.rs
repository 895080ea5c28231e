// crates/t2-core/src/operation.rs - Command -> external operation mapping
//
// Each command resolves to exactly one Operation. A few commands branch on
// their own flags (`update --list`, `ap --on`, `wifi --ssid`, ...); that
// choice is made here, from the resolved options, before anything runs.

use crate::error::{CliError, CliResult};
use crate::options::ResolvedOptions;
use crate::registry::CommandName;

/// What the crash-reporter command does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrashAction {
    Status,
    /// Enable, then run either the test report or a status check
    On { then_test: bool },
    Off,
    Test,
    Submit(String),
}

/// The single external operation an invocation performs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Restart,
    Update,
    PrintAvailableUpdates,
    Restore,
    Rename,
    SetupLocal,
    EnableAccessPoint,
    DisableAccessPoint,
    CreateAccessPoint,
    GetAccessPointInfo,
    Provision,
    Reboot,
    EraseScript,
    GetWifiInfo,
    PrintAvailableNetworks,
    SetWifiState,
    ConnectToNetwork,
    Root,
    Deploy,
    ListDevices,
    CrashReporter(CrashAction),
    CreateNewProject,
    InstallDrivers,
    InstallHomedir,
    EnvVersions,
}

impl Operation {
    /// Select the operation for `command` given its resolved options
    pub fn select(command: CommandName, options: &ResolvedOptions) -> CliResult<Self> {
        let op = match command {
            CommandName::Restart => Self::Restart,
            CommandName::Update if options.flag("list") => Self::PrintAvailableUpdates,
            CommandName::Update => Self::Update,
            CommandName::Restore => Self::Restore,
            CommandName::Rename => Self::Rename,
            CommandName::Key => Self::SetupLocal,
            CommandName::Ap => select_access_point(options)?,
            CommandName::Provision => Self::Provision,
            CommandName::Reboot => Self::Reboot,
            CommandName::Erase => Self::EraseScript,
            CommandName::Wifi => select_wifi(options)?,
            CommandName::Root => Self::Root,
            CommandName::Run | CommandName::Push => Self::Deploy,
            CommandName::List => Self::ListDevices,
            CommandName::CrashReporter => Self::CrashReporter(select_crash_action(options)?),
            CommandName::Init => Self::CreateNewProject,
            CommandName::Install => match options.get_str("operation") {
                Some("drivers") => Self::InstallDrivers,
                Some("homedir") => Self::InstallHomedir,
                _ => return Err(CliError::validation("operation", "expected drivers or homedir")),
            },
            CommandName::Version => Self::EnvVersions,
        };
        Ok(op)
    }

    /// Operation name as the device agent knows it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restart => "restart",
            Self::Update => "update",
            Self::PrintAvailableUpdates => "printAvailableUpdates",
            Self::Restore => "restore",
            Self::Rename => "rename",
            Self::SetupLocal => "setupLocal",
            Self::EnableAccessPoint => "enableAccessPoint",
            Self::DisableAccessPoint => "disableAccessPoint",
            Self::CreateAccessPoint => "createAccessPoint",
            Self::GetAccessPointInfo => "getAccessPointInfo",
            Self::Provision => "provision",
            Self::Reboot => "reboot",
            Self::EraseScript => "eraseScript",
            Self::GetWifiInfo => "getWifiInfo",
            Self::PrintAvailableNetworks => "printAvailableNetworks",
            Self::SetWifiState => "setWiFiState",
            Self::ConnectToNetwork => "connectToNetwork",
            Self::Root => "root",
            Self::Deploy => "deploy",
            Self::ListDevices => "listTessels",
            Self::CrashReporter(_) => "crashReporter",
            Self::CreateNewProject => "createNewProject",
            Self::InstallDrivers => "drivers",
            Self::InstallHomedir => "homedir",
            Self::EnvVersions => "envVersions",
        }
    }
}

fn exclusive(options: &ResolvedOptions, a: &str, b: &str) -> CliResult<()> {
    if options.flag(a) && options.flag(b) {
        return Err(CliError::validation(
            format!("--{}", a),
            format!("cannot be combined with --{}", b),
        ));
    }
    Ok(())
}

fn select_access_point(options: &ResolvedOptions) -> CliResult<Operation> {
    exclusive(options, "on", "off")?;

    Ok(if options.flag("on") {
        Operation::EnableAccessPoint
    } else if options.flag("off") {
        Operation::DisableAccessPoint
    } else if options.get_str("ssid").is_some() {
        Operation::CreateAccessPoint
    } else {
        Operation::GetAccessPointInfo
    })
}

fn select_wifi(options: &ResolvedOptions) -> CliResult<Operation> {
    exclusive(options, "on", "off")?;

    if options.flag("list") {
        return Ok(Operation::PrintAvailableNetworks);
    }
    if options.flag("on") || options.flag("off") {
        return Ok(Operation::SetWifiState);
    }
    if options.get_str("ssid").is_some() {
        let open_network = options.get_str("security").is_none_or(|s| s == "none");
        if options.get_str("password").is_none() && !open_network {
            return Err(CliError::validation(
                "--password",
                "required when connecting to a secured network",
            ));
        }
        return Ok(Operation::ConnectToNetwork);
    }
    if options.get_str("password").is_some() {
        return Err(CliError::validation("--ssid", "required with --password"));
    }
    Ok(Operation::GetWifiInfo)
}

fn select_crash_action(options: &ResolvedOptions) -> CliResult<CrashAction> {
    exclusive(options, "on", "off")?;

    Ok(if options.flag("off") {
        CrashAction::Off
    } else if options.flag("on") {
        CrashAction::On {
            then_test: options.flag("test"),
        }
    } else if options.flag("test") {
        CrashAction::Test
    } else if let Some(path) = options.get_str("submit") {
        CrashAction::Submit(path.to_string())
    } else {
        CrashAction::Status
    })
}
