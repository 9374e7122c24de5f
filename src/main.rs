use std::process::ExitCode;

use clap::Parser;
use inventory_domain::{HostSource, InMemoryHostSource, InventoryBuilder};
use inventory_persistence::PgHostFetcher;
use log::error;
use tag_inventory::{logging, run, CommandLine};

fn main() -> ExitCode {
    // Cargar .env antes de leer INVENTORY_LOG y la conexión
    inventory_persistence::init_dotenv();
    logging::init();
    let cmd = CommandLine::parse();

    let builder = InventoryBuilder::from_env();
    // Configuración inválida se trata igual que una base caída: inventario vacío
    let source: Box<dyn HostSource> = match PgHostFetcher::from_env() {
        Ok(fetcher) => Box::new(fetcher),
        Err(e) => {
            error!("database configuration error, returning empty inventory: {e}");
            Box::new(InMemoryHostSource::default())
        }
    };

    let mut stdout = std::io::stdout().lock();
    match run(&cmd, source.as_ref(), &builder, &mut stdout) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
