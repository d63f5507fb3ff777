//! Bucket and object identifier validation, virtual-host addressing helpers
//! and the well-known service constants.

pub const ACL_PUBLIC_READ_WRITE: &str = "public-read-write";
pub const ACL_PUBLIC_READ: &str = "public-read";
pub const ACL_PRIVATE: &str = "private";

pub const LOCATION_CN_QINGDAO: &str = "oss-cn-qingdao";
pub const LOCATION_CN_BEIJING: &str = "oss-cn-beijing";
pub const LOCATION_CN_HANGZHOU: &str = "oss-cn-hangzhou";
pub const LOCATION_CN_HONGKONG: &str = "oss-cn-hongkong";
pub const LOCATION_CN_SHENZHEN: &str = "oss-cn-shenzhen";
pub const LOCATION_CN_SHANGHAI: &str = "oss-cn-shanghai";
pub const LOCATION_US_WEST_1: &str = "oss-us-west-1";
pub const LOCATION_AP_SOUTHEAST_1: &str = "oss-ap-southeast-1";

/// Access domain for a location; the intranet domain when `internal` is set.
pub fn endpoint_domain(location: &str, internal: bool) -> String {
    let mut domain = if location.is_empty() {
        "oss".to_string()
    } else {
        location.to_string()
    };
    if internal {
        domain.push_str("-internal");
    }
    domain + ".aliyuncs.com"
}

/// A valid bucket name is 3 to 255 characters of lowercase letters, digits
/// and hyphens, and neither starts nor ends with a hyphen.
pub fn is_bucket_name(name: &str) -> bool {
    let len = name.len();
    (3..=255).contains(&len)
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
        && !name.starts_with('-')
        && !name.ends_with('-')
}

/// A valid object name is 1 to 1023 bytes and does not start with `/` or
/// `\`. UTF-8 validity is guaranteed by the `&str` type.
pub fn is_object_name(name: &str) -> bool {
    let len = name.len();
    (1..=1023).contains(&len) && !name.starts_with('/') && !name.starts_with('\\')
}

/// `/bucket/key` when both names validate, `None` otherwise. A `None` marks
/// an invalid cross-object reference for copy operations.
pub fn full_resource_name(bucket: &str, key: &str) -> Option<String> {
    if is_bucket_name(bucket) && is_object_name(key) {
        Some(format!("/{bucket}/{key}"))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_names() {
        assert!(is_bucket_name("oss-example"));
        assert!(is_bucket_name("abc"));
        assert!(!is_bucket_name("ab"));
        assert!(!is_bucket_name("-abc"));
        assert!(!is_bucket_name("abc-"));
        assert!(!is_bucket_name("ABC"));
        assert!(!is_bucket_name("a_b_c"));
        assert!(!is_bucket_name(&"a".repeat(256)));
    }

    #[test]
    fn object_names() {
        assert!(is_object_name("nelson"));
        assert!(is_object_name("dir/nested/key"));
        assert!(!is_object_name(""));
        assert!(!is_object_name("/leading"));
        assert!(!is_object_name("\\leading"));
        assert!(!is_object_name(&"k".repeat(1024)));
        assert!(is_object_name(&"k".repeat(1023)));
    }

    #[test]
    fn full_resource_name_requires_both_valid() {
        assert_eq!(
            full_resource_name("bucket", "key").as_deref(),
            Some("/bucket/key")
        );
        assert_eq!(full_resource_name("b", "key"), None);
        assert_eq!(full_resource_name("bucket", "/key"), None);
    }

    #[test]
    fn domains() {
        assert_eq!(endpoint_domain("", false), "oss.aliyuncs.com");
        assert_eq!(
            endpoint_domain(LOCATION_CN_HANGZHOU, false),
            "oss-cn-hangzhou.aliyuncs.com"
        );
        assert_eq!(
            endpoint_domain(LOCATION_CN_BEIJING, true),
            "oss-cn-beijing-internal.aliyuncs.com"
        );
    }
}
