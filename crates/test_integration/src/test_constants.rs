use std::time::Duration;

pub const OWNER_ID: &str = "parent-1";
pub const OWNER_EMAIL: &str = "parent@example.com";
pub const OWNER_PASSWORD: &str = "correct horse";

pub const GRANTEE_ID: &str = "grandparent-1";
pub const GRANTEE_EMAIL: &str = "grandma@example.com";
pub const GRANTEE_PASSWORD: &str = "battery staple";

pub const CHILD_ID: &str = "child-1";

/// Upper bound for background listeners to catch up.
pub const WAIT: Duration = Duration::from_secs(3);
