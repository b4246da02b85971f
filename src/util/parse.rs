/* This file is part of Gallus (https://gallus.fi)
 *
 * Copyright (C) 2020-2025 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use crate::{Error, Result};

/// Encode an atomic-unit amount into a base 10 string with the given number
/// of decimal places.
pub fn encode_base10(amount: u64, decimal_places: usize) -> String {
    let mut s: Vec<char> =
        format!("{:0width$}", amount, width = 1 + decimal_places).chars().collect();
    s.insert(s.len() - decimal_places, '.');
    String::from_iter(&s).trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Decode a base 10 string into an atomic-unit amount with the given number
/// of decimal places. In strict mode, an amount with excess precision is
/// rejected instead of truncated.
pub fn decode_base10(amount: &str, decimal_places: usize, strict: bool) -> Result<u64> {
    let mut s: Vec<String> = amount.split('.').map(|x| x.to_string()).collect();

    // Only single dot allowed
    match s.len() {
        1 => s.push(String::new()),
        2 => {}
        _ => return Err(Error::ParseFailed("Too many decimal points")),
    }

    if s[0].is_empty() && s[1].is_empty() {
        return Err(Error::ParseFailed("Amount is empty"))
    }

    if !s[0].chars().all(|c| c.is_ascii_digit()) || !s[1].chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::ParseFailed("Amount is not a number"))
    }

    if s[1].len() > decimal_places {
        if strict {
            return Err(Error::ParseFailed("Amount has too many decimal places"))
        }
        s[1].truncate(decimal_places);
    }

    while s[1].len() < decimal_places {
        s[1].push('0');
    }

    Ok(s.join("").parse::<u64>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_base10() {
        assert_eq!("1.1", encode_base10(110_000_000, 8));
        assert_eq!("0.00000011", encode_base10(11, 8));
        assert_eq!("42", encode_base10(4_200_000_000, 8));
        assert_eq!("0", encode_base10(0, 8));
        assert_eq!("123", encode_base10(123, 0));
    }

    #[test]
    fn test_decode_base10() {
        assert_eq!(110_000_000, decode_base10("1.1", 8, false).unwrap());
        assert_eq!(11, decode_base10("0.00000011", 8, false).unwrap());
        assert_eq!(4_200_000_000, decode_base10("42", 8, false).unwrap());
        assert_eq!(50_000_000, decode_base10(".5", 8, false).unwrap());

        // Excess precision is truncated, unless strict
        assert_eq!(0, decode_base10("0.000000001", 8, false).unwrap());
        assert!(decode_base10("0.000000001", 8, true).is_err());

        assert!(decode_base10("1.1.1", 8, false).is_err());
        assert!(decode_base10("chicken", 8, false).is_err());
        assert!(decode_base10("", 8, false).is_err());
    }

    #[test]
    fn test_base10_roundtrip() {
        for amount in [0_u64, 1, 99, 100_000_000, 123_456_789, u32::MAX as u64] {
            let encoded = encode_base10(amount, 8);
            assert_eq!(amount, decode_base10(&encoded, 8, true).unwrap());
        }
    }
}
