//! OpenRTB schema layer for the ADX exchange.
//!
//! Typed bid request/response structures covering the subset of OpenRTB 2.x
//! that this exchange exercises. Every protocol object keeps a lossless
//! extension slot: fields the schema does not model (including the OpenRTB
//! `ext` object itself) are captured verbatim and written back on
//! serialization, so a parse → serialize round trip preserves
//! unknown-but-well-formed input.
//!
//! Parsing and serialization go through [`BidRequest::parse`] /
//! [`BidRequest::to_json`] (and the [`BidResponse`] equivalents), which
//! validate required fields and structural invariants the wire format only
//! implies: non-empty impression lists, unique impression ids, at most one
//! creative shape per impression, and the Site/App mutual exclusion.

pub mod request;
pub mod response;

pub use request::{
    App, Banner, BidRequest, Content, Creative, Data, Device, Format, Geo, Impression,
    InventoryContext, Native, Publisher, Regs, Segment, Site, User, Video,
};
pub use response::{Bid, BidResponse, NoBidReason, SeatBid};
