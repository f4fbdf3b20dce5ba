//! seshload - synthetic session load harness.
//!
//! Two independent flows behind one binary:
//!
//! - **sessions**: issues synthetic login requests against a web service,
//!   harvests the session cookies it hands back into flat text files (one
//!   per device category), and re-validates harvested cookies against the
//!   service's current-user endpoint.
//! - **lookup**: resolves base64-encoded session identifiers from a file
//!   against the backing Redis session store and writes the matches out.
//!
//! There is no scheduler and no persistence beyond the flat files; the
//! harness is plain fan-out over HTTP with a fixed throttle and a bounded
//! worker pool.

pub mod config;
pub mod cookies;
pub mod harness;
pub mod lookup;
pub mod profile;
pub mod session;
