//! Extension trait, auctioneers, and the extension registry for Helion.
//!
//! An integration step is driven through an [`ExtensionList`]: stage `k1`
//! polls every registered [`Extension`] for validity, an [`Auctioneer`]
//! resolves the claims into a frozen mask, and every stage plus finalize
//! dispatches to the masked-in extensions in registration order.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod auctioneer;
pub mod extension;
pub mod registry;

pub use auctioneer::{AcceptAll, Auctioneer, FirstValidOnly, ValidityMask};
pub use extension::Extension;
pub use registry::{ExtensionList, ExtensionListBuilder, StepPhase};
