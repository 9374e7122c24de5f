//! Inicialización de logs. Todo va a stderr: stdout queda reservado para el
//! documento JSON que consume la plataforma de automatización.

use tracing_subscriber::EnvFilter;

/// Variable con la directiva de filtro (sintaxis `EnvFilter`).
pub const LOG_ENV: &str = "INVENTORY_LOG";
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Instala el subscriber global. Los registros emitidos con `log` por las
/// librerías se reenvían a través del puente `tracing-log`. Llamadas
/// repetidas no tienen efecto.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    let _ = tracing_subscriber::fmt().with_env_filter(filter)
                                     .with_writer(std::io::stderr)
                                     .with_target(false)
                                     .try_init();
}
