//! Module for core business logic services.
//!
//! This module encapsulates services that perform specific business
//! operations and orchestrate interactions between different parts of the
//! application, such as the account lifecycle, email delivery and the
//! third-party identity bridge.

pub mod account_service;
pub mod email_service;
pub mod oauth_service;
