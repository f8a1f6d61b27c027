// SPDX-License-Identifier: MIT

//! CRM-API: authentication and token-lifecycle backend for the CRM.
//!
//! This crate provides registration, login, access-token issuance (JWT),
//! refresh-token rotation, and the role-based authorization gate that
//! protected resource routes sit behind.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::UserStore;
use services::TokenService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub users: UserStore,
    pub tokens: TokenService,
}
