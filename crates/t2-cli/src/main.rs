// crates/t2-cli/src/main.rs - CLI Application Entry Point
//
// ┌────────────┐    ┌──────────────────┐    ┌──────────────────────┐
// │  argv      │───▶│  Dispatcher      │───▶│  Collaborators       │
// │            │    │  (t2-core)       │    │  (controller.rs,     │
// └────────────┘    └──────────────────┘    │   services/*.rs)     │
//                           │               └──────────────────────┘
//                           ▼
//                   ┌──────────────────┐
//                   │  Closer -> exit  │
//                   └──────────────────┘
//
// EXAMPLE USAGE:
// ```bash
// t2 list --timeout 2                   # Find devices on LAN and USB
// t2 run index.js [--port 8080]         # Run on the device, args after it
// t2 push index.js --name bishop        # Deploy to flash on one device
// t2 wifi --ssid home --password hunter2
// ```

use std::process::ExitCode;
use t2_core::{Closer, Dispatcher, OperationError, Plan, Services, Termination, TracingConsole};
use tracing::warn;

mod context;
mod controller;
mod logging;
mod services;

use context::Context;
use controller::DeviceController;
use logging::{LoggingConfig, init_logging};
use services::{FileCrashReporter, LanSeeker, SystemInstaller, UsbSeeker};

fn exit_code(termination: &Termination) -> ExitCode {
    ExitCode::from(u8::try_from(termination.exit_status()).unwrap_or(1))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let logging = init_logging(&LoggingConfig::default());

    let ctx = match Context::from_env(args.first().map(String::as_str)) {
        Ok(ctx) => ctx,
        Err(err) => {
            let termination = Closer::new(&TracingConsole).close_failed(OperationError::from(err), None);
            return exit_code(&termination);
        }
    };

    let lan = LanSeeker::new(&ctx.config.lan);
    let usb = UsbSeeker::new(&ctx.config.usb);
    let controller = DeviceController::new(&ctx, &lan, &usb);
    let crash_reporter = FileCrashReporter::new(&ctx.preferences, ctx.crash_dir(), ctx.config.crash.enabled);
    let installer = SystemInstaller::new(ctx.home().to_path_buf(), ctx.config.usb.rules_dir.clone().into());

    let dispatcher = Dispatcher::new(Services {
        controller: &controller,
        crash_reporter: &crash_reporter,
        installer: &installer,
        preferences: &ctx.preferences,
    });

    let prepared = dispatcher.prepare(&args).await;
    let options = prepared
        .as_ref()
        .ok()
        .and_then(Plan::invocation)
        .map(|invocation| &invocation.options);
    if let Some(logging) = &logging {
        if let Err(err) = logging.apply(&LoggingConfig::from_options(options)) {
            warn!("Cannot apply logging options: {}", err);
        }
    }

    let termination = dispatcher.finish(prepared, Closer::new(&TracingConsole)).await;
    exit_code(&termination)
}
