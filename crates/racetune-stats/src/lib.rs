//! Statistical summaries for fitness samples collected while tuning.
//!
//! The optimizer receives one fitness scalar per race episode. Looking at the
//! raw sequence quickly becomes unreadable, so both the controller and the
//! command-line tools summarize batches of fitness values with
//! [`descriptive::DescriptiveStats`].
//!
//! # Examples
//!
//! ```
//! use racetune_stats::descriptive::DescriptiveStats;
//!
//! let fitness = [120.0, 340.5, 80.0, 512.25];
//! let stats = DescriptiveStats::new(fitness).unwrap();
//! assert_eq!(stats.max, 512.25);
//! assert_eq!(stats.count, 4);
//! ```

pub mod descriptive;
