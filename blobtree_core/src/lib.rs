//! # Blobtree Core
//!
//! Hierarchical trees and directory-mirroring trees of blobs.
//!
//! This library provides two layers:
//!
//! - A generic arena-backed n-ary tree ([`TreeArena`]) with reparenting,
//!   lazy ancestor/descendant/sibling traversal and a stack-based fluent
//!   [`TreeNodeBuilder`].
//! - A directory-shaped tree of named binary payloads ([`BlobTree`],
//!   [`BlobTreeNode`], [`Blob`]) that can be read from and written back to a
//!   live directory tree, queried by `\`-separated paths and flattened.
//!
//! ## Features
//!
//! - Files map to blobs and directories to nodes, bytes verbatim
//! - Two-phase saves: every name is validated before the first write
//! - Atomic per-file writes
//! - BLAKE3 content digests for blobs and whole subtrees
//! - Optional `.gitignore`-aware directory import
//!
//! ## Example
//!
//! ```no_run
//! use blobtree_core::{Blob, BlobTree};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Mirror a directory
//! let mut tree = BlobTree::from_directory("./my-data")?;
//!
//! // Look things up by path
//! if let Some(readme) = tree.find_blob("docs\\README.md", true)? {
//!     println!("{} bytes", readme.len());
//! }
//!
//! // Edit and write back
//! tree.root_mut().blobs.push(Blob::new("NOTES", b"hello".to_vec()));
//! tree.save_to_directory("./restored")?;
//! println!("{} bytes in {} blobs", tree.compute_size(), tree.flatten().len());
//! # Ok(())
//! # }
//! ```

mod blob;
mod blob_tree;
mod builder;
mod error;
mod fsio;
mod hash;
mod names;
mod node;

pub use blob::{Blob, BlobCollection};
pub use blob_tree::{BlobTree, BlobTreeNode, BlobTreeNodeCollection, PATH_SEPARATOR};
pub use builder::TreeNodeBuilder;
pub use error::{Error, Result};
pub use fsio::{SaveOptions, WalkOptions};
pub use hash::{HASH_SIZE, Hash};
pub use names::{MAX_NAME_LEN, is_legal_file_name, names_equal, validate_file_name};
pub use node::{Ancestors, Descendants, NodeId, NodeRef, Siblings, TreeArena};
