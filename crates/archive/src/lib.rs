//! Lazy member extraction from bulk submission archives.
//!
//! Bulk archives from the source bucket are uncompressed tar containers;
//! the submissions inside them are either gzip bundles (`.gz`, possibly a
//! gzipped tar) or plain files. This crate detects the container format
//! from content, never from the filename, and yields members one at a time
//! so that a multi-gigabyte archive never has to be resident twice.
//!
//! Extraction is purely in-memory: nothing is written to disk, and a
//! consumed [`Extractor`] cannot be rewound — re-open from the original
//! bytes instead.
//!
//! ```
//! use arxcat_archive::Extractor;
//!
//! let mut builder = tar::Builder::new(Vec::new());
//! let mut header = tar::Header::new_gnu();
//! header.set_size(5);
//! header.set_cksum();
//! builder.append_data(&mut header, "9912.00001.gz", &b"hello"[..]).unwrap();
//! let bytes = builder.into_inner().unwrap();
//!
//! let mut extractor = Extractor::open(&bytes).unwrap();
//! for member in extractor.members().unwrap() {
//!     let member = member.unwrap();
//!     println!("{}: {} bytes", member.path.display(), member.size());
//! }
//! ```

mod container;
pub mod error;
mod extract;
mod member;

pub use crate::container::Container;
pub use crate::extract::{Extractor, Members};
pub use crate::member::{ArchiveMember, member_paths_unique, validate_member_path};
