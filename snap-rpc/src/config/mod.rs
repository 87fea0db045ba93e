mod app;
pub use app::App;

mod database;
pub use database::{Database, State};

mod endpoints;
pub use endpoints::Endpoints;

mod snap;
pub use snap::Snap;

mod config;
pub use config::Config;

mod parser;
pub use parser::Parser;
