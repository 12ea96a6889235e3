//! Nickname mutation on server rejection (`ERR_NICKNAMEINUSE` /
//! `ERR_ERRONEOUSNICKNAME`), ported from the upstream daemon's
//! `ircclient_generate_nick`.
//!
//! Short nicks grow a trailing `-`; once at the length cap the last
//! character is mutated in place, carrying leftward through `-` then
//! `0`..`9` then `_`. A nick that bottoms out entirely in `_` resets to the
//! fallback nickname verbatim, unmutated.

const MUTATE_LEN: usize = 9;
pub const FALLBACK_NICKNAME: &str = "dircproxy";

pub fn generate_nick(nick: &str) -> String {
    if nick.len() < MUTATE_LEN {
        let mut next = nick.to_string();
        next.push('-');
        return next;
    }

    let mut chars: Vec<char> = nick.chars().collect();
    let mut i = chars.len();
    loop {
        if i == 0 {
            return FALLBACK_NICKNAME.to_string();
        }
        i -= 1;
        match chars[i] {
            '-' => {
                chars[i] = '0';
                break;
            }
            c if c.is_ascii_digit() && c != '9' => {
                chars[i] = ((c as u8) + 1) as char;
                break;
            }
            '9' => {
                chars[i] = '_';
                break;
            }
            '_' => continue,
            _ => {
                chars[i] = '-';
                break;
            }
        }
    }
    chars.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_nick_grows_a_trailing_dash() {
        assert_eq!(generate_nick("alice"), "alice-");
        assert_eq!(generate_nick("bob"), "bob-");
    }

    #[test]
    fn nick_at_cap_mutates_last_char() {
        // "alice1234" is 9 chars, at the cap: mutate the trailing '4'.
        assert_eq!(generate_nick("alice1234"), "alice1235");
    }

    #[test]
    fn trailing_dash_mutates_to_zero() {
        assert_eq!(generate_nick("alicebbb-"), "alicebbb0");
    }

    #[test]
    fn trailing_nine_mutates_to_underscore() {
        assert_eq!(generate_nick("alicebbb9"), "alicebbb_");
    }

    #[test]
    fn carry_propagates_leftward_through_underscores() {
        // 9 chars, at the cap: trailing '9' mutates to '_' first...
        let once = generate_nick("aliceb__9");
        assert_eq!(once, "aliceb___");
        // ...then the next call carries past the run of '_' to mutate 'b'.
        let twice = generate_nick(&once);
        assert_eq!(twice, "alice-___");
    }

    #[test]
    fn exhausted_all_underscore_nick_resets_to_fallback_unmutated() {
        let exhausted = "_________";
        assert_eq!(generate_nick(exhausted), FALLBACK_NICKNAME);
    }

    #[test]
    fn generator_is_total_and_bounded() {
        let mut nick = "x".to_string();
        for _ in 0..200 {
            nick = generate_nick(&nick);
            assert!(nick.len() <= FALLBACK_NICKNAME.len() + 1);
            assert!(nick.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'));
        }
    }
}
