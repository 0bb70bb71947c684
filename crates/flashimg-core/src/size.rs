//! Number and size string parsing
//!
//! Offsets and lengths accept the usual integer literal forms: decimal,
//! `0x` hexadecimal and C-style octal with a leading `0`. Sizes additionally
//! accept a binary multiplier suffix (`K`, `M`, `G`, optionally followed by
//! `iB` or `B`, case-insensitive).

/// Parse an integer in decimal, `0x` hex or leading-`0` octal
pub fn parse_number(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty number".to_string());
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).map_err(|e| format!("invalid hex value '{}': {}", s, e))
    } else if s.len() > 1 && s.starts_with('0') {
        u64::from_str_radix(&s[1..], 8).map_err(|e| format!("invalid octal value '{}': {}", s, e))
    } else {
        s.parse::<u64>()
            .map_err(|e| format!("invalid number '{}': {}", s, e))
    }
}

/// Parse a size such as `4096`, `0x1000`, `64M` or `128 KiB`
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();

    if let Ok(n) = parse_number(s) {
        return Ok(n);
    }

    let lower = s.to_ascii_lowercase();
    let digits_end = match lower.strip_prefix("0x") {
        Some(hex) => 2 + hex.find(|c: char| !c.is_ascii_hexdigit()).unwrap_or(hex.len()),
        None => lower.find(|c: char| !c.is_ascii_digit()).unwrap_or(lower.len()),
    };
    let (num_str, unit) = lower.split_at(digits_end);

    let shift = match unit.trim() {
        "k" | "kb" | "kib" => 10,
        "m" | "mb" | "mib" => 20,
        "g" | "gb" | "gib" => 30,
        "b" => 0,
        _ => return Err(format!("invalid size suffix in '{}'", s)),
    };

    let num = parse_number(num_str).map_err(|_| format!("invalid size: {}", s))?;
    num.checked_mul(1u64 << shift)
        .ok_or_else(|| format!("size too large: {}", s))
}

/// Format a size as a human-readable string
pub fn format_size(size: u64) -> String {
    const GIB: u64 = 1 << 30;
    const MIB: u64 = 1 << 20;
    const KIB: u64 = 1 << 10;

    if size >= GIB && size % GIB == 0 {
        format!("{} GiB", size / GIB)
    } else if size >= MIB && size % MIB == 0 {
        format!("{} MiB", size / MIB)
    } else if size >= KIB && size % KIB == 0 {
        format!("{} KiB", size / KIB)
    } else {
        format!("{} B", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("4096").unwrap(), 4096);
        assert_eq!(parse_number("0x1000").unwrap(), 4096);
        assert_eq!(parse_number("0X1000").unwrap(), 4096);
        assert_eq!(parse_number("010").unwrap(), 8);
        assert_eq!(parse_number("0").unwrap(), 0);
        assert!(parse_number("").is_err());
        assert!(parse_number("09").is_err());
        assert!(parse_number("-1").is_err());
        assert!(parse_number("boot").is_err());
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("4096").unwrap(), 4096);
        assert_eq!(parse_size("0x1000").unwrap(), 4096);
        assert_eq!(parse_size("4K").unwrap(), 4096);
        assert_eq!(parse_size("4k").unwrap(), 4096);
        assert_eq!(parse_size("4 KiB").unwrap(), 4096);
        assert_eq!(parse_size("64M").unwrap(), 64 * 1024 * 1024);
        assert_eq!(parse_size("16MiB").unwrap(), 16 * 1024 * 1024);
        assert_eq!(parse_size("1G").unwrap(), 1 << 30);
        assert!(parse_size("12Q").is_err());
        assert!(parse_size("M").is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(4096), "4 KiB");
        assert_eq!(format_size(16 * 1024 * 1024), "16 MiB");
        assert_eq!(format_size(1000), "1000 B");
        assert_eq!(format_size(2 << 30), "2 GiB");
    }
}
