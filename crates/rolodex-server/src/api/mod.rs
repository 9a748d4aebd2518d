//! REST endpoints.
//!
//! Every endpoint is registered on a [`Router`](crate::router::Router) and
//! therefore mounted under its prefix:
//!
//! | Method | Path | Module |
//! |--------|------|--------|
//! | `POST` | `/contacts` | [`contacts`] |
//! | `GET` | `/contacts` | [`contacts`] |
//! | `GET` | `/contacts/{id}` | [`contacts`] |
//! | `PUT` | `/contacts/{id}` | [`contacts`] |
//! | `DELETE` | `/contacts/{id}` | [`contacts`] |
//! | `GET` | `/greet/{who}` | [`greet`] |
//! | `GET` | `/panic` | [`panic`] |

pub mod contacts;
pub mod greet;
pub mod panic;
