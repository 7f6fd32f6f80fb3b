use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NumericError {
    #[error("Empty numeric payload")]
    Empty,

    #[error("Non-digit character at position {0}")]
    NonDigit(usize),
}

/// 每次处理的十进制位数 (10^9 < 2^32)
const CHUNK_DIGITS: usize = 9;

/// 10 的幂次表
const POW10: [u64; CHUNK_DIGITS + 1] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    1_000_000_000,
];

/// 将十进制数字串转换为最小长度的大端字节序列
///
/// 与 "转十六进制、奇数长度时左补一个 0" 的做法等价：结果总是整字节，
/// 且不带多余的前导零字节。数值 0 编码为单个 `0x00` 字节。
pub fn decimal_to_bytes(digits: &str) -> Result<Vec<u8>, NumericError> {
    if digits.is_empty() {
        return Err(NumericError::Empty);
    }
    if let Some(pos) = digits.bytes().position(|b| !b.is_ascii_digit()) {
        return Err(NumericError::NonDigit(pos));
    }

    // 小端 u32 分量
    let mut limbs: Vec<u32> = Vec::with_capacity(digits.len() / 9 + 1);

    for chunk in digits.as_bytes().chunks(CHUNK_DIGITS) {
        let multiplier = POW10[chunk.len()];
        let mut carry = chunk
            .iter()
            .fold(0u64, |acc, b| acc * 10 + u64::from(b - b'0'));

        for limb in limbs.iter_mut() {
            let value = u64::from(*limb) * multiplier + carry;
            *limb = value as u32;
            carry = value >> 32;
        }
        if carry > 0 {
            limbs.push(carry as u32);
        }
    }

    let mut bytes: Vec<u8> = limbs
        .iter()
        .rev()
        .flat_map(|limb| limb.to_be_bytes())
        .skip_while(|b| *b == 0)
        .collect();

    if bytes.is_empty() {
        bytes.push(0);
    }

    Ok(bytes)
}

/// 将大端字节序列转换为十进制数字串（`decimal_to_bytes` 的逆运算）
///
/// 前导零字节不会保留。
pub fn bytes_to_decimal(bytes: &[u8]) -> String {
    let mut limbs: Vec<u32> = bytes
        .rchunks(4)
        .map(|chunk| chunk.iter().fold(0u32, |acc, b| (acc << 8) | u32::from(*b)))
        .collect();
    // 转为大端分量以便做长除法
    limbs.reverse();

    let divisor = POW10[CHUNK_DIGITS];
    let mut groups: Vec<u32> = Vec::new();

    while limbs.iter().any(|l| *l != 0) {
        let mut remainder = 0u64;
        for limb in limbs.iter_mut() {
            let value = (remainder << 32) | u64::from(*limb);
            *limb = (value / divisor) as u32;
            remainder = value % divisor;
        }
        groups.push(remainder as u32);

        let leading = limbs.iter().take_while(|l| **l == 0).count();
        limbs.drain(..leading);
    }

    match groups.split_last() {
        None => "0".to_string(),
        Some((most_significant, rest)) => {
            let mut out = most_significant.to_string();
            for group in rest.iter().rev() {
                out.push_str(&format!("{:09}", group));
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_values() {
        assert_eq!(decimal_to_bytes("0").unwrap(), vec![0x00]);
        assert_eq!(decimal_to_bytes("15").unwrap(), vec![0x0f]);
        assert_eq!(decimal_to_bytes("255").unwrap(), vec![0xff]);
        assert_eq!(decimal_to_bytes("256").unwrap(), vec![0x01, 0x00]);
        assert_eq!(decimal_to_bytes("4095").unwrap(), vec![0x0f, 0xff]);
    }

    #[test]
    fn test_leading_zero_digits_ignored() {
        assert_eq!(decimal_to_bytes("000256").unwrap(), vec![0x01, 0x00]);
        assert_eq!(decimal_to_bytes("0000").unwrap(), vec![0x00]);
    }

    #[test]
    fn test_known_vectors() {
        // 2^64
        assert_eq!(
            decimal_to_bytes("18446744073709551616").unwrap(),
            vec![1, 0, 0, 0, 0, 0, 0, 0, 0]
        );

        let expected: Vec<u8> = (1..=40).collect();
        let digits = "8409268453606351112543261157699428548070624494014657579491620939676866586695024695207663118120";
        assert_eq!(decimal_to_bytes(digits).unwrap(), expected);
        assert_eq!(bytes_to_decimal(&expected), digits);

        assert_eq!(
            decimal_to_bytes("85970684548876642247275578395075471744466620175").unwrap(),
            vec![0x0f; 20]
        );
    }

    #[test]
    fn test_rejects_non_digits() {
        assert_eq!(decimal_to_bytes(""), Err(NumericError::Empty));
        assert_eq!(decimal_to_bytes("12a4"), Err(NumericError::NonDigit(2)));
        assert_eq!(decimal_to_bytes("-1"), Err(NumericError::NonDigit(0)));
        assert_eq!(decimal_to_bytes("١٢"), Err(NumericError::NonDigit(0)));
    }

    #[test]
    fn test_bytes_to_decimal() {
        assert_eq!(bytes_to_decimal(&[]), "0");
        assert_eq!(bytes_to_decimal(&[0, 0]), "0");
        assert_eq!(bytes_to_decimal(&[0x01, 0x00]), "256");
        assert_eq!(bytes_to_decimal(&[0x3b, 0x9a, 0xca, 0x00]), "1000000000");
        assert_eq!(bytes_to_decimal(&[0x00, 0xff]), "255");
    }

    #[test]
    fn test_large_payload_survives_conversion() {
        let mut payload = vec![0x78, 0x9c];
        payload.extend((0..600u32).map(|i| (i * 7 + 3) as u8));
        let digits = bytes_to_decimal(&payload);
        assert!(digits.bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(decimal_to_bytes(&digits).unwrap(), payload);
    }
}
