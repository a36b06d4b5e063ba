mod entry;
mod logger;
mod shutdown_handlers;

use volley::error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
