// utils.rs - Sphinx utility functions
// Copyright (C) 2018  David Anthony Stainton and Jeffrey Burdges.
//
// MIT License
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use subtle::ConstantTimeEq;

/// xor `b` into `a`, both slices must be the same length.
pub fn xor_assign(a: &mut [u8], b: &[u8]) {
    assert!(a.len() == b.len(), "sphinx: BUG: xor_assign called with mismatched buffer sizes");
    for (a_i, &b_i) in a.iter_mut().zip(b.iter()) {
        *a_i ^= b_i;
    }
}

/// constant time check that every byte of `b` is zero.
pub fn ct_is_zero(b: &[u8]) -> bool {
    let acc = b.iter().fold(0u8, |acc, &x| acc | x);
    acc.ct_eq(&0u8).unwrap_u8() == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xor_test() {
        let mut a = [0x0fu8; 4];
        xor_assign(&mut a, &[0xf0, 0x0f, 0x00, 0xff]);
        assert_eq!(a, [0xff, 0x00, 0x0f, 0xf0]);
    }

    #[test]
    #[should_panic]
    fn xor_mismatched_test() {
        let mut a = [0u8; 3];
        xor_assign(&mut a, &[0u8; 4]);
    }

    #[test]
    fn ct_is_zero_test() {
        assert!(ct_is_zero(&[]));
        assert!(ct_is_zero(&[0u8; 16]));
        let mut b = [0u8; 16];
        b[15] = 0x80;
        assert!(!ct_is_zero(&b));
    }
}
