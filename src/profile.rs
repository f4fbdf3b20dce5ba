//! Device-profile selection.
//!
//! A profile is a user-agent string paired with a coarse category
//! (mobile/desktop) used to vary request fingerprints. Selection draws
//! uniformly over a combined index space and maps even draws to mobile,
//! odd draws to desktop. That guarantees an even split between the two
//! categories but NOT per-entry uniformity when the lists differ in
//! length. That skew is inherited behavior and is kept as-is.

use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

pub const MOBILE_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0_3 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPad; CPU OS 17_7_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 10; ONEPLUS A6003) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.6778.135 Mobile Safari/537.36 EdgA/131.0.2903.87",
    "Mozilla/5.0 (Linux; Android 10; VOG-L29) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.6778.135 Mobile Safari/537.36 OPR/76.2.4027.73374",
];

pub const DESKTOP_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36 OPR/115.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/70.0.3538.102 Safari/537.36 Edge/18.19582",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.6 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 6.1; Win64; x64; rv:109.0) Gecko/20100101 Firefox/115.0",
];

/// Coarse device category a user-agent belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCategory {
    Mobile,
    Desktop,
}

impl DeviceCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }
}

/// A selected profile: the user-agent to send and its category.
#[derive(Debug, Clone, Copy)]
pub struct SelectedProfile {
    pub user_agent: &'static str,
    pub category: DeviceCategory,
}

/// Registry of device profiles, constructed once at startup and shared
/// by reference across concurrent creator tasks.
///
/// Selection counters are atomic; concurrent increments never undercount.
pub struct ProfileRegistry {
    mobile: &'static [&'static str],
    desktop: &'static [&'static str],
    mobile_enabled: bool,
    desktop_enabled: bool,
    mobile_count: AtomicU64,
    desktop_count: AtomicU64,
}

impl ProfileRegistry {
    /// Build a registry over the fixed user-agent lists.
    ///
    /// At least one category must be enabled; callers validate that before
    /// construction.
    pub fn new(mobile_enabled: bool, desktop_enabled: bool) -> Self {
        debug_assert!(mobile_enabled || desktop_enabled);
        Self {
            mobile: MOBILE_USER_AGENTS,
            desktop: DESKTOP_USER_AGENTS,
            mobile_enabled,
            desktop_enabled,
            mobile_count: AtomicU64::new(0),
            desktop_count: AtomicU64::new(0),
        }
    }

    /// Pick a profile using the thread-local RNG.
    pub fn select(&self) -> SelectedProfile {
        self.select_with(&mut rand::thread_rng())
    }

    /// Pick a profile with a caller-supplied RNG.
    ///
    /// With both categories enabled, an even draw maps to mobile and an
    /// odd draw to desktop; the entry index is `n / 2`, reduced modulo the
    /// list length so the draw cannot run off the shorter list. The
    /// combined space is sized to twice the longer list, keeping the
    /// even/odd parity exactly fair.
    pub fn select_with<R: Rng>(&self, rng: &mut R) -> SelectedProfile {
        let profile = match (self.mobile_enabled, self.desktop_enabled) {
            (true, true) => {
                let n = rng.gen_range(0..2 * self.mobile.len().max(self.desktop.len()));
                if n % 2 == 0 {
                    SelectedProfile {
                        user_agent: self.mobile[(n / 2) % self.mobile.len()],
                        category: DeviceCategory::Mobile,
                    }
                } else {
                    SelectedProfile {
                        user_agent: self.desktop[(n / 2) % self.desktop.len()],
                        category: DeviceCategory::Desktop,
                    }
                }
            }
            (true, false) => SelectedProfile {
                user_agent: self.mobile[rng.gen_range(0..self.mobile.len())],
                category: DeviceCategory::Mobile,
            },
            _ => SelectedProfile {
                user_agent: self.desktop[rng.gen_range(0..self.desktop.len())],
                category: DeviceCategory::Desktop,
            },
        };
        match profile.category {
            DeviceCategory::Mobile => self.mobile_count.fetch_add(1, Ordering::Relaxed),
            DeviceCategory::Desktop => self.desktop_count.fetch_add(1, Ordering::Relaxed),
        };
        profile
    }

    /// (mobile, desktop) selection counts so far.
    pub fn counts(&self) -> (u64, u64) {
        (
            self.mobile_count.load(Ordering::Relaxed),
            self.desktop_count.load(Ordering::Relaxed),
        )
    }
}
