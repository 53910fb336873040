//! The title catalog.
//!
//! A [`Catalog`] maps each title's short name to a [`CatalogEntry`] holding
//! the download variants found on its detail page. It is built in two
//! passes: [`parse_index`] lists the titles on the index page, then
//! [`parse_detail`] classifies the links of every title's page. The
//! [`CatalogBuilder`] drives both passes over a
//! [`PageSource`](crate::http::PageSource).
//!
//! ```rust
//! use nxbrew_dl::catalog::short_name;
//!
//! assert_eq!(short_name("Super Game (USA) [NSP]"), "super game");
//! assert_eq!(short_name("Super Game: Deluxe (Europe)"), "super game deluxe");
//! ```

pub mod builder;
pub mod detail;
pub mod entry;
pub mod index;

pub use builder::CatalogBuilder;
pub use detail::{parse_detail, parse_size};
pub use entry::{
    short_name, strip_tags, Catalog, CatalogEntry, DownloadVariant, FileType, TitleStub,
    VariantKind,
};
pub use index::parse_index;
