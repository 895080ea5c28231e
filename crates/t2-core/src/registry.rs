// crates/t2-core/src/registry.rs - Command and option tables
//
// The registry is the single source of truth for which commands exist and
// which options each of them accepts. It is built once at startup and is
// read-only afterwards; the parser turns a CommandDef into a clap command
// and the resolver walks the same specs to apply defaults and validation.
//
// Every command receives the common option set (timeout, name, lan, usb,
// lanPrefer, output, loglevel) after its own options.

use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

use crate::error::CliError;
use crate::options::OptionValue;

/// How an option's raw text is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Presence-only; `true` whenever given, whatever follows `=`
    Flag,
    /// Value option coerced from `true`/`false`
    Boolean,
    /// Decimal number
    Number,
    /// Free text (quotes removed)
    Text,
    /// Comma separated list
    List,
}

/// Declaration of one command-line option
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    pub name: &'static str,
    pub abbr: Option<char>,
    pub metavar: Option<&'static str>,
    pub help: &'static str,
    pub default: Option<OptionValue>,
    pub kind: OptionKind,
    /// 1-based positional index; positional options have no long form
    pub position: Option<usize>,
    /// Allowed values, empty when unrestricted
    pub choices: &'static [&'static str],
}

impl CommandSpec {
    fn new(name: &'static str, kind: OptionKind) -> Self {
        Self {
            name,
            abbr: None,
            metavar: None,
            help: "",
            default: None,
            kind,
            position: None,
            choices: &[],
        }
    }

    pub fn flag_option(name: &'static str) -> Self {
        Self::new(name, OptionKind::Flag)
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, OptionKind::Boolean)
    }

    pub fn number(name: &'static str) -> Self {
        Self::new(name, OptionKind::Number)
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, OptionKind::Text)
    }

    pub fn list(name: &'static str) -> Self {
        Self::new(name, OptionKind::List)
    }

    pub fn abbr(mut self, abbr: char) -> Self {
        self.abbr = Some(abbr);
        self
    }

    pub fn metavar(mut self, metavar: &'static str) -> Self {
        self.metavar = Some(metavar);
        self
    }

    pub fn help(mut self, help: &'static str) -> Self {
        self.help = help;
        self
    }

    pub fn default<V: Into<OptionValue>>(mut self, value: V) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    pub fn choices(mut self, choices: &'static [&'static str]) -> Self {
        self.choices = choices;
        self
    }

    /// Presence-only option
    pub fn flag(&self) -> bool {
        self.kind == OptionKind::Flag
    }

    /// Canonical spelling used in diagnostics
    pub fn string(&self) -> String {
        match self.position {
            Some(_) => self.name.to_string(),
            None => format!("--{}", self.name),
        }
    }
}

/// Every command the CLI understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandName {
    Restart,
    Update,
    Restore,
    Rename,
    Key,
    Ap,
    Provision,
    Reboot,
    Erase,
    Wifi,
    Root,
    Run,
    Push,
    List,
    CrashReporter,
    Init,
    Install,
    Version,
}

impl CommandName {
    pub const ALL: [CommandName; 18] = [
        Self::Restart,
        Self::Update,
        Self::Restore,
        Self::Rename,
        Self::Key,
        Self::Ap,
        Self::Provision,
        Self::Reboot,
        Self::Erase,
        Self::Wifi,
        Self::Root,
        Self::Run,
        Self::Push,
        Self::List,
        Self::CrashReporter,
        Self::Init,
        Self::Install,
        Self::Version,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Restart => "restart",
            Self::Update => "update",
            Self::Restore => "restore",
            Self::Rename => "rename",
            Self::Key => "key",
            Self::Ap => "ap",
            Self::Provision => "provision",
            Self::Reboot => "reboot",
            Self::Erase => "erase",
            Self::Wifi => "wifi",
            Self::Root => "root",
            Self::Run => "run",
            Self::Push => "push",
            Self::List => "list",
            Self::CrashReporter => "crash-reporter",
            Self::Init => "init",
            Self::Install => "install",
            Self::Version => "version",
        }
    }

    pub fn about(&self) -> &'static str {
        match self {
            Self::Restart => "Restart a previously deployed script in RAM or Flash memory",
            Self::Update => "Update the device firmware",
            Self::Restore => "Restore the device to factory firmware",
            Self::Rename => "Change the device name",
            Self::Key => "Manage the local SSH key used to authorize with devices",
            Self::Ap => "Configure the device as an access point",
            Self::Provision => "Authorize this computer to control the USB-connected device",
            Self::Reboot => "Reboot the device",
            Self::Erase => "Erase the deployed script from Flash memory",
            Self::Wifi => "Configure the wireless connection",
            Self::Root => "Open a root shell on the device",
            Self::Run => "Deploy a script to device RAM and run it",
            Self::Push => "Deploy a script to device Flash memory and run it on boot",
            Self::List => "List all connected devices",
            Self::CrashReporter => "Configure the crash reporter",
            Self::Init => "Initialize a repository for a device project",
            Self::Install => "Install USB drivers or the CLI home directory",
            Self::Version => "Report the CLI and device firmware versions",
        }
    }

    /// Whether the command needs to locate a device first
    pub fn needs_device(&self) -> bool {
        !matches!(
            self,
            Self::Key | Self::CrashReporter | Self::Init | Self::Install
        )
    }

    /// Whether the command launches a program that takes passthrough args
    pub fn takes_subargs(&self) -> bool {
        matches!(self, Self::Run | Self::Push)
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandName {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| CliError::UnknownCommand(s.to_string()))
    }
}

/// All options of one command, in declaration order
#[derive(Debug, Clone)]
pub struct CommandDef {
    pub name: CommandName,
    pub specs: IndexMap<&'static str, CommandSpec>,
}

impl CommandDef {
    pub fn spec(&self, name: &str) -> Option<&CommandSpec> {
        self.specs.get(name)
    }

    pub fn specs(&self) -> impl Iterator<Item = &CommandSpec> {
        self.specs.values()
    }
}

const RESTART_TYPES: &[&str] = &["ram", "flash"];
const AP_SECURITY: &[&str] = &["none", "wep", "psk", "psk2"];
const WIFI_SECURITY: &[&str] = &["none", "wep", "psk", "psk2", "wpa", "wpa2"];
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "basic"];
const INSTALL_OPERATIONS: &[&str] = &["drivers", "homedir"];

/// Options shared by every command
pub fn common_specs() -> Vec<CommandSpec> {
    vec![
        CommandSpec::number("timeout")
            .abbr('t')
            .metavar("TIMEOUT")
            .help("Set timeout in seconds for scanning for networked tessels")
            .default(5.0),
        CommandSpec::text("name")
            .metavar("NAME")
            .help("The name of the tessel on which the command will be executed"),
        CommandSpec::flag_option("lan").help("Use only a LAN connection"),
        CommandSpec::flag_option("usb").help("Use only a USB connection"),
        CommandSpec::flag_option("lanPrefer")
            .help("Prefer a LAN connection if it's available, otherwise use USB")
            .default(false),
        CommandSpec::boolean("output")
            .metavar("BOOL")
            .help("Enable or disable writing command output to the console")
            .default(true),
        CommandSpec::text("loglevel")
            .metavar("LEVEL")
            .help("Set the verbosity of log output")
            .choices(LOG_LEVELS)
            .default("basic"),
    ]
}

fn deploy_specs(push: bool) -> Vec<CommandSpec> {
    vec![
        CommandSpec::text("entryPoint")
            .metavar("FILE")
            .position(1)
            .help("The program entry point file to deploy"),
        CommandSpec::flag_option("slim")
            .help("Bundle only the files the entry point depends on")
            .default(true),
        CommandSpec::flag_option("full")
            .help("Deploy every file in the project directory")
            .default(false),
        CommandSpec::boolean("compress")
            .metavar("BOOL")
            .help("Compress the bundle before transfer")
            .default(true),
        CommandSpec::flag_option("single")
            .help("Deploy only the entry point file")
            .default(false),
        CommandSpec::list("binopts")
            .metavar("OPTS")
            .help("Comma separated options for the program binary"),
        CommandSpec::flag_option("lanPrefer")
            .help("Prefer a LAN connection if it's available, otherwise use USB")
            .default(push),
    ]
}

fn command_specs(name: CommandName) -> Vec<CommandSpec> {
    match name {
        CommandName::Restart => vec![
            CommandSpec::text("entryPoint")
                .metavar("FILE")
                .help("The previously deployed entry point file to restart"),
            CommandSpec::text("type")
                .metavar("TYPE")
                .help("Where the script is stored: ram or flash")
                .choices(RESTART_TYPES)
                .default("ram"),
        ],
        CommandName::Update => vec![
            CommandSpec::number("version")
                .metavar("VERSION")
                .help("Update to a specific firmware version"),
            CommandSpec::flag_option("list")
                .abbr('l')
                .help("List the available firmware versions"),
            CommandSpec::flag_option("force")
                .help("Update even if the device is already on that version"),
        ],
        CommandName::Restore => vec![
            CommandSpec::flag_option("force").help("Skip the confirmation prompt"),
        ],
        CommandName::Rename => vec![
            CommandSpec::text("newName")
                .metavar("NAME")
                .position(1)
                .help("The new name for the device"),
            CommandSpec::flag_option("reset").help("Reset the name to the device's MAC address"),
        ],
        CommandName::Key => vec![
            CommandSpec::flag_option("generate").help("Generate a new local key"),
        ],
        CommandName::Ap => vec![
            CommandSpec::flag_option("on").help("Enable the access point"),
            CommandSpec::flag_option("off").help("Disable the access point"),
            CommandSpec::text("ssid")
                .metavar("SSID")
                .help("Name of the access point to create"),
            CommandSpec::text("password")
                .metavar("PASSWORD")
                .help("Password of the access point"),
            CommandSpec::text("security")
                .metavar("SECURITY")
                .help("Encryption of the access point")
                .choices(AP_SECURITY),
        ],
        CommandName::Wifi => vec![
            CommandSpec::flag_option("list")
                .abbr('l')
                .help("List the available wifi networks"),
            CommandSpec::flag_option("on").help("Enable the wifi radio"),
            CommandSpec::flag_option("off").help("Disable the wifi radio"),
            CommandSpec::text("ssid")
                .abbr('n')
                .metavar("SSID")
                .help("Name of the network to connect to"),
            CommandSpec::text("password")
                .abbr('p')
                .metavar("PASSWORD")
                .help("Password of the network"),
            CommandSpec::text("security")
                .abbr('s')
                .metavar("SECURITY")
                .help("Encryption of the network")
                .choices(WIFI_SECURITY),
        ],
        CommandName::Provision => vec![
            CommandSpec::flag_option("force").help("Replace the key already on the device"),
        ],
        CommandName::Reboot | CommandName::Erase | CommandName::Root | CommandName::Version => {
            Vec::new()
        }
        CommandName::Run => deploy_specs(false),
        CommandName::Push => deploy_specs(true),
        CommandName::List => vec![
            CommandSpec::text("key")
                .abbr('i')
                .metavar("PATH")
                .help("SSH key used to authorize with the devices"),
        ],
        CommandName::CrashReporter => vec![
            CommandSpec::flag_option("on").help("Enable the crash reporter"),
            CommandSpec::flag_option("off").help("Disable the crash reporter"),
            CommandSpec::flag_option("test").help("Post a test report"),
            CommandSpec::text("submit")
                .metavar("PATH")
                .help("Submit a saved crash report file"),
        ],
        CommandName::Init => vec![
            CommandSpec::text("directory")
                .metavar("DIR")
                .position(1)
                .help("Directory for the new project (defaults to the current directory)"),
            CommandSpec::text("lang")
                .metavar("LANG")
                .help("Project language")
                .default("js"),
        ],
        CommandName::Install => vec![
            CommandSpec::text("operation")
                .metavar("OPERATION")
                .position(1)
                .help("What to install: drivers or homedir")
                .choices(INSTALL_OPERATIONS),
        ],
    }
}

/// Build the full option set for `name`
///
/// Command options come first; a common option is skipped when the command
/// already declares one with the same name (e.g. push's `lanPrefer`).
pub fn make_command(name: CommandName) -> CommandDef {
    let mut specs = IndexMap::new();
    for spec in command_specs(name).into_iter().chain(common_specs()) {
        specs.entry(spec.name).or_insert(spec);
    }
    CommandDef { name, specs }
}

/// Static table of every command definition
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: IndexMap<CommandName, CommandDef>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let commands = CommandName::ALL
            .iter()
            .map(|name| (*name, make_command(*name)))
            .collect();
        Self { commands }
    }

    pub fn get(&self, name: CommandName) -> &CommandDef {
        // every CommandName is inserted in new()
        &self.commands[&name]
    }

    pub fn lookup(&self, name: &str) -> Result<&CommandDef, CliError> {
        let name = name.parse::<CommandName>()?;
        Ok(self.get(name))
    }

    pub fn commands(&self) -> impl Iterator<Item = &CommandDef> {
        self.commands.values()
    }

    /// Plain command listing shown for `t2` / `t2 help`
    pub fn usage(&self) -> String {
        let mut text = String::from("Usage: t2 <command> [options]\n\nCommands:\n");
        for def in self.commands() {
            text.push_str(&format!("  {:<16}{}\n", def.name.as_str(), def.name.about()));
        }
        text
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
