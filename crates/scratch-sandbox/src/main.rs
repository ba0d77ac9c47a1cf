mod pulse;
mod sandbox;

use std::process::ExitCode;

use scratch_engine::device::GpuInit;
use scratch_engine::gfx::ErrorPolicy;
use scratch_engine::logging::{init_logging, LoggingConfig};
use scratch_engine::window::{Runtime, RuntimeConfig};

use sandbox::Sandbox;

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    // Colors are written as-is, the way a linear framebuffer shows them.
    let gpu_init = GpuInit {
        prefer_srgb: false,
        ..GpuInit::default()
    };

    match Runtime::run(
        RuntimeConfig::default(),
        gpu_init,
        Sandbox::new(ErrorPolicy::for_build()),
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
