// crates/t2-core/src/dispatch.rs - Invocation pipeline
//
// raw argv
//   -> registry lookup
//   -> subargs::extract          (run/push only)
//   -> resolve                   (awaits the preference store at most once)
//   -> TransportPolicy           (device commands only)
//   -> Operation::select
//   -> one external operation    (await)
//   -> Closer
//
// `prepare` stops before the external operation so the binary can apply
// the resolved `--loglevel`/`--output` first; `finish` logs the resolved
// invocation, runs the operation and closes.

use tracing::debug;

use crate::closer::{Closer, Termination};
use crate::controller::{Controller, CrashReporter, Installer, Invocation, OpResult};
use crate::error::{CliError, CliResult};
use crate::operation::{CrashAction, Operation};
use crate::preferences::PreferenceStore;
use crate::registry::CommandRegistry;
use crate::resolve;
use crate::subargs::{self, SplitArgs};
use crate::transport::TransportPolicy;

/// External collaborators for one process
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub controller: &'a dyn Controller,
    pub crash_reporter: &'a dyn CrashReporter,
    pub installer: &'a dyn Installer,
    pub preferences: &'a dyn PreferenceStore,
}

/// Fully resolved work for one invocation
#[derive(Debug, Clone)]
pub enum Plan {
    /// `t2` or `t2 help`: print the command list
    Usage(String),
    Run {
        operation: Operation,
        invocation: Invocation,
    },
}

impl Plan {
    pub fn invocation(&self) -> Option<&Invocation> {
        match self {
            Self::Usage(_) => None,
            Self::Run { invocation, .. } => Some(invocation),
        }
    }
}

pub struct Dispatcher<'a> {
    registry: CommandRegistry,
    services: Services<'a>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(services: Services<'a>) -> Self {
        Self {
            registry: CommandRegistry::new(),
            services,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Parse and resolve `args` (program name excluded)
    pub async fn prepare(&self, args: &[String]) -> CliResult<Plan> {
        let Some(command) = args.first() else {
            return Ok(Plan::Usage(self.registry.usage()));
        };
        if matches!(command.as_str(), "help" | "--help" | "-h") {
            return Ok(Plan::Usage(self.registry.usage()));
        }

        let def = self.registry.lookup(command)?;
        // brackets only delimit a group for commands that pass arguments on
        let split = if def.name.takes_subargs() {
            subargs::extract(args)?
        } else {
            SplitArgs {
                argv: args.to_vec(),
                subargs: Vec::new(),
            }
        };
        let options = resolve::resolve(def, &split.argv, split.subargs, self.services.preferences).await?;

        let transport = if def.name.needs_device() {
            Some(TransportPolicy::from_options(&options)?)
        } else {
            None
        };

        let operation = Operation::select(def.name, &options)?;

        Ok(Plan::Run {
            operation,
            invocation: Invocation {
                command: def.name,
                options,
                transport,
            },
        })
    }

    /// Invoke the external operation for `operation` exactly once
    pub async fn dispatch(&self, operation: &Operation, invocation: &Invocation) -> OpResult {
        let controller = self.services.controller;
        let installer = self.services.installer;

        match operation {
            Operation::Restart => controller.restart(invocation).await,
            Operation::Update => controller.update(invocation).await,
            Operation::PrintAvailableUpdates => controller.print_available_updates(invocation).await,
            Operation::Restore => controller.restore(invocation).await,
            Operation::Rename => controller.rename(invocation).await,
            Operation::SetupLocal => controller.setup_local(invocation).await,
            Operation::EnableAccessPoint => controller.enable_access_point(invocation).await,
            Operation::DisableAccessPoint => controller.disable_access_point(invocation).await,
            Operation::CreateAccessPoint => controller.create_access_point(invocation).await,
            Operation::GetAccessPointInfo => controller.get_access_point_info(invocation).await,
            Operation::Provision => controller.provision(invocation).await,
            Operation::Reboot => controller.reboot(invocation).await,
            Operation::EraseScript => controller.erase_script(invocation).await,
            Operation::GetWifiInfo => controller.get_wifi_info(invocation).await,
            Operation::PrintAvailableNetworks => controller.print_available_networks(invocation).await,
            Operation::SetWifiState => controller.set_wifi_state(invocation).await,
            Operation::ConnectToNetwork => controller.connect_to_network(invocation).await,
            Operation::Root => controller.root(invocation).await,
            Operation::Deploy => controller.deploy(invocation).await,
            Operation::ListDevices => controller.list_devices(invocation).await,
            Operation::CrashReporter(action) => self.crash_reporter(action).await,
            Operation::CreateNewProject => controller.create_new_project(invocation).await,
            Operation::InstallDrivers => installer.drivers(invocation).await,
            Operation::InstallHomedir => installer.homedir(invocation).await,
            Operation::EnvVersions => controller.env_versions(invocation).await,
        }
    }

    async fn crash_reporter(&self, action: &CrashAction) -> OpResult {
        let reporter = self.services.crash_reporter;
        match action {
            CrashAction::Status => reporter.status().await,
            CrashAction::On { then_test } => {
                reporter.on().await?;
                if *then_test {
                    reporter.test().await
                } else {
                    reporter.status().await
                }
            }
            CrashAction::Off => reporter.off().await,
            CrashAction::Test => reporter.test().await,
            CrashAction::Submit(path) => reporter.submit(path).await,
        }
    }

    /// Run a prepared plan (or report why preparing failed) and close
    pub async fn finish(&self, prepared: CliResult<Plan>, closer: Closer<'_>) -> Termination {
        let outcome = match prepared {
            Ok(Plan::Usage(text)) => return closer.close_successful(Some(&text)),
            Ok(Plan::Run {
                operation,
                invocation,
            }) => {
                debug!(
                    command = %invocation.command,
                    operation = operation.as_str(),
                    options = %invocation.options.to_json(),
                    "dispatching"
                );
                self.dispatch(&operation, &invocation)
                    .await
                    .map_err(CliError::from)
            }
            Err(err) => Err(err),
        };

        match outcome {
            Ok(()) => closer.close_successful(None),
            Err(err) => closer.close_failed(err, None),
        }
    }

    /// Whole lifecycle for one argv
    pub async fn run(&self, args: &[String], closer: Closer<'_>) -> Termination {
        let prepared = self.prepare(args).await;
        self.finish(prepared, closer).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, OperationError};
    use crate::preferences::ENTRY_POINT_KEY;
    use crate::testing::{FakeController, FakeCrashReporter, FakeInstaller, FakePreferences, RecordingConsole};
    use crate::transport::TransportMode;

    struct Harness {
        controller: FakeController,
        crash_reporter: FakeCrashReporter,
        installer: FakeInstaller,
        preferences: FakePreferences,
        console: RecordingConsole,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                controller: FakeController::default(),
                crash_reporter: FakeCrashReporter::default(),
                installer: FakeInstaller::default(),
                preferences: FakePreferences::empty(),
                console: RecordingConsole::default(),
            }
        }

        fn with_preferences(preferences: FakePreferences) -> Self {
            Self {
                preferences,
                ..Self::new()
            }
        }

        fn dispatcher(&self) -> Dispatcher<'_> {
            Dispatcher::new(Services {
                controller: &self.controller,
                crash_reporter: &self.crash_reporter,
                installer: &self.installer,
                preferences: &self.preferences,
            })
        }

        async fn run(&self, tokens: &[&str]) -> Termination {
            let args: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
            self.dispatcher().run(&args, Closer::new(&self.console)).await
        }
    }

    #[tokio::test]
    async fn test_restart_invokes_once() {
        let h = Harness::new();
        let termination = h.run(&["restart", "--entryPoint=index.js", "--type=ram"]).await;
        assert!(termination.is_success());
        assert_eq!(h.controller.calls("restart"), 1);
        assert_eq!(h.controller.total_calls(), 1);
    }

    #[tokio::test]
    async fn test_rejected_operation_exits_one() {
        let h = Harness::new();
        h.controller.fail_with("restart", OperationError::new("Some error happened."));

        let termination = h.run(&["restart", "--entryPoint=index.js", "--type=ram"]).await;
        assert_eq!(h.controller.calls("restart"), 1);
        assert_eq!(h.console.errors(), vec!["Some error happened.".to_string()]);
        assert_eq!(termination.exit_status(), 1);
    }

    #[tokio::test]
    async fn test_invalid_type_never_reaches_restart() {
        let h = Harness::new();
        let termination = h.run(&["restart", "--entryPoint=index.js", "--type=any"]).await;
        assert_eq!(h.controller.calls("restart"), 0);
        assert_eq!(h.console.warnings(), vec!["--type Invalid".to_string()]);
        assert_eq!(termination.exit_status(), 1);
    }

    #[tokio::test]
    async fn test_restart_entry_point_from_preferences() {
        let h = Harness::with_preferences(FakePreferences::with(ENTRY_POINT_KEY, "previous.js"));
        let termination = h.run(&["restart"]).await;
        assert!(termination.is_success());
        let invocation = h.controller.last_invocation("restart").unwrap();
        assert_eq!(invocation.options.get_str("entryPoint"), Some("previous.js"));
    }

    #[tokio::test]
    async fn test_restart_without_any_entry_point() {
        let h = Harness::new();
        let termination = h.run(&["restart"]).await;
        assert_eq!(h.controller.total_calls(), 0);
        assert_eq!(
            h.console.warnings(),
            vec!["Cannot determine entry point file name".to_string()]
        );
        assert_eq!(termination.exit_status(), 1);
    }

    #[tokio::test]
    async fn test_update_forwards_options() {
        let h = Harness::new();
        h.run(&["update", "--version", "42"]).await;
        assert_eq!(h.controller.calls("update"), 1);
        let invocation = h.controller.last_invocation("update").unwrap();
        assert_eq!(invocation.options.get_number("version"), Some(42.0));
        assert_eq!(invocation.options.get_number("timeout"), Some(5.0));
        assert_eq!(invocation.options.get_bool("lanPrefer"), Some(false));
        assert_eq!(invocation.options.get_bool("output"), Some(true));
        assert_eq!(invocation.options.get_str("loglevel"), Some("basic"));

        h.run(&["update", "--list"]).await;
        assert_eq!(h.controller.calls("update"), 1);
        assert_eq!(h.controller.calls("printAvailableUpdates"), 1);
    }

    #[tokio::test]
    async fn test_simple_commands_map_to_one_operation() {
        let cases = [
            ("restore", "restore"),
            ("rename", "rename"),
            ("provision", "provision"),
            ("reboot", "reboot"),
            ("erase", "eraseScript"),
            ("root", "root"),
            ("version", "envVersions"),
            ("list", "listTessels"),
        ];
        for (command, operation) in cases {
            let h = Harness::new();
            let termination = h.run(&[command]).await;
            assert!(termination.is_success(), "{command}");
            assert_eq!(h.controller.calls(operation), 1, "{command}");
            assert_eq!(h.controller.total_calls(), 1, "{command}");
        }
    }

    #[tokio::test]
    async fn test_key_generate() {
        let h = Harness::new();
        h.run(&["key", "--generate=1"]).await;
        assert_eq!(h.controller.calls("setupLocal"), 1);
        let invocation = h.controller.last_invocation("setupLocal").unwrap();
        assert!(invocation.options.flag("generate"));
        assert!(invocation.transport.is_none());
    }

    #[tokio::test]
    async fn test_access_point_flags() {
        let cases = [
            (vec!["ap", "--on"], "enableAccessPoint"),
            (vec!["ap", "--off"], "disableAccessPoint"),
            (vec!["ap", "--ssid=foo"], "createAccessPoint"),
            (vec!["ap"], "getAccessPointInfo"),
        ];
        for (tokens, operation) in cases {
            let h = Harness::new();
            h.run(&tokens).await;
            assert_eq!(h.controller.calls(operation), 1, "{tokens:?}");
            assert_eq!(h.controller.total_calls(), 1, "{tokens:?}");
        }
    }

    #[tokio::test]
    async fn test_wifi_flags() {
        let cases = [
            (vec!["wifi"], "getWifiInfo"),
            (vec!["wifi", "--list"], "printAvailableNetworks"),
            (vec!["wifi", "--off"], "setWiFiState"),
            (vec!["wifi", "--on"], "setWiFiState"),
            (vec!["wifi", "--ssid", "a", "--password", "b"], "connectToNetwork"),
        ];
        for (tokens, operation) in cases {
            let h = Harness::new();
            let termination = h.run(&tokens).await;
            assert!(termination.is_success(), "{tokens:?}");
            assert_eq!(h.controller.calls(operation), 1, "{tokens:?}");
            assert_eq!(h.controller.total_calls(), 1, "{tokens:?}");
        }
    }

    #[tokio::test]
    async fn test_wifi_failures_close_failed() {
        for (tokens, operation) in [
            (vec!["wifi", "--list"], "printAvailableNetworks"),
            (vec!["wifi", "--ssid", "a", "--password", "b"], "connectToNetwork"),
        ] {
            let h = Harness::new();
            h.controller.fail_with(operation, OperationError::new("radio off"));
            let termination = h.run(&tokens).await;
            assert!(!termination.is_success());
            assert_eq!(h.console.errors().len(), 1);
        }
    }

    #[tokio::test]
    async fn test_wifi_values_with_brackets_are_kept() {
        let h = Harness::new();
        let termination = h.run(&["wifi", "--ssid", "home", "--password", "hunter2]"]).await;
        assert!(termination.is_success());
        let invocation = h.controller.last_invocation("connectToNetwork").unwrap();
        assert_eq!(invocation.options.get_str("password"), Some("hunter2]"));

        let h = Harness::new();
        let termination = h.run(&["wifi", "--ssid", "[lab]", "--password", "x"]).await;
        assert!(termination.is_success());
        let invocation = h.controller.last_invocation("connectToNetwork").unwrap();
        assert_eq!(invocation.options.get_str("ssid"), Some("[lab]"));
        assert_eq!(invocation.options.get_str("password"), Some("x"));
    }

    #[tokio::test]
    async fn test_run_and_push_deploy() {
        let h = Harness::new();
        h.run(&["run", "index.js", "[--port", "8080]"]).await;
        let invocation = h.controller.last_invocation("deploy").unwrap();
        assert_eq!(invocation.options.get_bool("push"), Some(false));
        assert_eq!(invocation.options.subargs(), &["--port".to_string(), "8080".to_string()][..]);
        assert_eq!(invocation.transport.as_ref().unwrap().mode(), TransportMode::Either);

        let h = Harness::new();
        h.run(&["push", "index.js", "--binopts=--a,--b,--c"]).await;
        let invocation = h.controller.last_invocation("deploy").unwrap();
        assert_eq!(invocation.options.get_bool("push"), Some(true));
        assert_eq!(
            invocation.options.get_list("binopts").unwrap(),
            &["--a".to_string(), "--b".to_string(), "--c".to_string()][..]
        );
        assert_eq!(invocation.transport.as_ref().unwrap().mode(), TransportMode::LanFirst);
    }

    #[tokio::test]
    async fn test_list_with_key_and_timeout() {
        let h = Harness::new();
        h.run(&["list", "--timeout", "0.001", "-i", "./FAKE_KEY"]).await;
        let invocation = h.controller.last_invocation("listTessels").unwrap();
        assert_eq!(invocation.options.get_str("key"), Some("./FAKE_KEY"));
        let policy = invocation.transport.as_ref().unwrap();
        assert_eq!(policy.timeout, std::time::Duration::from_secs_f64(0.001));

        let h = Harness::new();
        h.run(&["list", "--timeout", "0.001", "--output=false"]).await;
        let invocation = h.controller.last_invocation("listTessels").unwrap();
        assert_eq!(invocation.options.get_str("key"), None);
        assert_eq!(invocation.options.get_bool("output"), Some(false));
    }

    #[tokio::test]
    async fn test_crash_reporter_sequences() {
        let cases: [(&[&str], &[&str]); 6] = [
            (&["crash-reporter"], &["status"]),
            (&["crash-reporter", "--on=true"], &["on", "status"]),
            (&["crash-reporter", "--off=true"], &["off"]),
            (&["crash-reporter", "--test=true"], &["test"]),
            (&["crash-reporter", "--on", "--test"], &["on", "test"]),
            (&["crash-reporter", "--submit", "r.json"], &["submit"]),
        ];
        for (tokens, expected) in cases {
            let h = Harness::new();
            let termination = h.run(tokens).await;
            assert!(termination.is_success(), "{tokens:?}");
            assert_eq!(h.crash_reporter.calls(), expected, "{tokens:?}");
            assert_eq!(h.controller.total_calls(), 0);
        }
    }

    #[tokio::test]
    async fn test_crash_reporter_on_failure_skips_status() {
        let h = Harness::new();
        h.crash_reporter.fail_on("on");
        let termination = h.run(&["crash-reporter", "--on"]).await;
        assert!(!termination.is_success());
        assert_eq!(h.crash_reporter.calls(), ["on"]);
    }

    #[tokio::test]
    async fn test_init_languages() {
        for (tokens, lang) in [
            (vec!["init"], "js"),
            (vec!["init", "--lang=js"], "js"),
            (vec!["init", "--lang=javascript"], "javascript"),
            (vec!["init", "--lang=rs"], "rs"),
            (vec!["init", "--lang=rust"], "rust"),
        ] {
            let h = Harness::new();
            h.run(&tokens).await;
            assert_eq!(h.controller.calls("createNewProject"), 1);
            let invocation = h.controller.last_invocation("createNewProject").unwrap();
            assert_eq!(invocation.options.get_str("lang"), Some(lang));
        }
    }

    #[tokio::test]
    async fn test_install_operations() {
        let h = Harness::new();
        h.run(&["install", "drivers"]).await;
        h.run(&["install", "homedir"]).await;
        assert_eq!(h.installer.calls(), ["drivers", "homedir"]);

        let last = h.installer.last_invocation().unwrap();
        assert_eq!(last.options.get_list("argv").unwrap()[0], "install");
        assert_eq!(last.options.get_str("operation"), Some("homedir"));
    }

    #[tokio::test]
    async fn test_error_code_from_operation() {
        let h = Harness::new();
        h.controller.fail_with("reboot", OperationError::new("for real").with_code("red"));
        let termination = h.run(&["reboot"]).await;
        assert_eq!(termination.code(), ErrorCode::Named("red".to_string()));
    }

    #[tokio::test]
    async fn test_zero_code_from_operation_still_fails() {
        let h = Harness::new();
        h.controller.fail_with("reboot", OperationError::new("device failed").with_code(0));
        let termination = h.run(&["reboot"]).await;
        assert_eq!(termination, Termination::Failure(ErrorCode::FAILURE));
        assert_eq!(termination.exit_status(), 1);
    }

    #[tokio::test]
    async fn test_exactly_one_close_per_invocation() {
        let invocations: [&[&str]; 7] = [
            &["reboot"],
            &["restart"],
            &["restart", "--type=any"],
            &["frobnicate"],
            &["reboot", "--bogus"],
            &["run", "x.js", "[a", "[b]"],
            &[],
        ];
        for tokens in invocations {
            let h = Harness::new();
            h.controller.fail_with("reboot", OperationError::new("boom"));
            let termination = h.run(tokens).await;
            let messages = h.console.total();
            match termination {
                Termination::Success => assert!(messages <= 1, "{tokens:?}"),
                Termination::Failure(_) => assert_eq!(messages, 1, "{tokens:?}"),
            }
            assert!(h.controller.total_calls() <= 1, "{tokens:?}");
        }
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let h = Harness::new();
        let termination = h.run(&["frobnicate"]).await;
        assert_eq!(h.console.warnings(), vec!["Unknown command: frobnicate".to_string()]);
        assert_eq!(termination.exit_status(), 1);
    }

    #[tokio::test]
    async fn test_usage_is_success() {
        let h = Harness::new();
        let termination = h.run(&[]).await;
        assert!(termination.is_success());
        assert!(h.console.infos()[0].contains("Usage: t2"));
    }
}
