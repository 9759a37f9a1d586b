// builders + env wrappers + higher level helpers
pub mod builders;
pub mod checkpoint;
pub mod rollout;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod wrappers;
