//! market-movers: momentum movers and daily baselines for an equity watchlist
//!
//! This library provides the core components for:
//! - Session labelling from exchange-local wall-clock time
//! - A time-bucketed price history store with rolling retention
//! - Momentum classification over 1/5/30-minute and day horizons
//! - Once-per-day baseline statistics (50-bar average, swing, beta)
//! - Snapshot ingestion from a market data provider
//! - Periodic task scheduling with cooperative shutdown
//! - Structured logging and metrics

pub mod baseline;
pub mod cli;
pub mod config;
pub mod context;
pub mod ingest;
pub mod momentum;
pub mod provider;
pub mod retry;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod watchlist;
