mod assets;
pub mod http;

pub use assets::{AssetStore, init_asset_store};
