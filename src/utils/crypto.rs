use hmac::{Hmac, Mac};
use rand::seq::SliceRandom;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Generate the plugin cipher key: a random permutation of the digits 0-9,
/// comma separated. The key only feeds the opaque username digest, it offers
/// no real cryptographic protection.
pub fn generate_cipher_key() -> String {
    let mut digits: Vec<u8> = (0..=9).collect();
    digits.shuffle(&mut rand::thread_rng());
    digits
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Keyed digest of a username, printed in review PDF headers so a candidate
/// cannot repudiate a report without the plain username appearing in it.
pub fn username_digest(cipher_key: &str, username: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(cipher_key.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(username.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cipher_key_is_a_digit_permutation() {
        let key = generate_cipher_key();
        let mut digits: Vec<&str> = key.split(',').collect();
        digits.sort_unstable();
        assert_eq!(digits, vec!["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"]);
    }

    #[test]
    fn digest_is_stable_for_the_same_key_and_username() {
        let key = "3,1,4,1,5,9,2,6,5,3";
        let a = username_digest(key, "mrossi");
        let b = username_digest(key, "mrossi");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, username_digest(key, "gverdi"));
        assert_ne!(a, username_digest("0,1,2,3,4,5,6,7,8,9", "mrossi"));
    }
}
