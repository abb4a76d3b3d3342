#![deny(warnings)]
pub mod belief;
pub mod distance;
pub mod model;
pub mod observation;

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "busters"
    }

    pub const fn codename() -> &'static str {
        "Ghost Hunt"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
