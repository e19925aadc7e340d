use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};

/// Exponent numerators/denominators beyond this are evaluated in floating point
const MAX_EXACT_EXPONENT: u32 = 64;

/// Parse an integer (`3`), decimal (`1.5`) or fraction (`3/2`) literal
pub fn parse_rational(text: &str) -> Option<BigRational> {
    let text = text.trim();
    if let Some((numer, denom)) = text.split_once('/') {
        let numer = parse_integer(numer)?;
        let denom = parse_digits(denom)?;
        if denom.is_zero() {
            return None;
        }
        return Some(BigRational::new(numer, denom));
    }
    if text.contains('.') {
        return parse_decimal(text);
    }
    parse_integer(text).map(BigRational::from_integer)
}

fn parse_digits(text: &str) -> Option<BigInt> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

fn split_sign(text: &str) -> (bool, &str) {
    match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    }
}

fn parse_integer(text: &str) -> Option<BigInt> {
    let (negative, digits) = split_sign(text);
    let value = parse_digits(digits)?;
    Some(if negative { -value } else { value })
}

fn parse_decimal(text: &str) -> Option<BigRational> {
    let (negative, body) = split_sign(text);
    let (int_part, frac_part) = body.split_once('.')?;
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let numer: BigInt = format!("{}{}", int_part, frac_part).parse().ok()?;
    let scale = u32::try_from(frac_part.len()).ok()?;
    let value = BigRational::new(numer, BigInt::from(10u32).pow(scale));
    Some(if negative { -value } else { value })
}

/// `base^(1/ell)` for a positive `ell`; exact whenever the root is rational
pub fn rational_root(base: u64, ell: &BigRational) -> BigRational {
    // base^(1/ell) = (base^denom)^(1/numer)
    let exact = ell
        .numer()
        .to_u32()
        .zip(ell.denom().to_u32())
        .filter(|&(n, d)| n > 0 && n <= MAX_EXACT_EXPONENT && d <= MAX_EXACT_EXPONENT)
        .and_then(|(n, d)| {
            let powered = BigInt::from(base).pow(d);
            let root = powered.nth_root(n);
            (root.pow(n) == powered).then(|| BigRational::from_integer(root))
        });

    exact.unwrap_or_else(|| {
        let exponent = to_f64(&ell.recip());
        BigRational::from_float((base as f64).powf(exponent)).unwrap_or_else(BigRational::zero)
    })
}

pub fn to_f64(value: &BigRational) -> f64 {
    match (value.numer().to_f64(), value.denom().to_f64()) {
        (Some(numer), Some(denom)) => numer / denom,
        _ => f64::NAN,
    }
}
