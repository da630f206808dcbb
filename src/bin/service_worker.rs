use log::error;
use prayer_clock::error::describe_js;
use prayer_clock::{logging, worker};

fn main() {
    // Set the panic hook to log detailed errors to the console
    console_error_panic_hook::set_once();
    // Only fails when a logger is already installed.
    let _ = logging::init(logging::default_level());
    if let Err(e) = worker::browser::register() {
        error!("[Service Worker] Could not attach listeners: {}", describe_js(&e));
    }
}
