use anyhow::{Context, Result, bail};

/// Parse a byte size such as `100M`, `1G`, `512k`, `4096` or `64MiB`.
/// Suffixes are binary (`1K` is 1024 bytes).
pub fn parse_size(input: &str) -> Result<u64> {
    let trimmed = input.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    if digits.is_empty() {
        bail!("size {input:?} does not start with a number");
    }
    let value: u64 = digits
        .parse()
        .with_context(|| format!("size {input:?} is out of range"))?;

    let shift = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 0,
        "k" | "kb" | "kib" => 10,
        "m" | "mb" | "mib" => 20,
        "g" | "gb" | "gib" => 30,
        "t" | "tb" | "tib" => 40,
        other => bail!("unknown size unit {other:?} in {input:?}"),
    };
    value
        .checked_mul(1u64 << shift)
        .with_context(|| format!("size {input:?} is out of range"))
}
