use nutype::nutype;

/// Public site key identifying this site towards the anti-spam challenge
/// provider.
#[nutype(
    sanitize(trim),
    validate(not_empty, len_char_max = 256),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ChallengeSiteKey(String);

/// Opaque token proving that a challenge has been passed.
#[nutype(
    validate(not_empty, len_char_max = 2048),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ChallengeToken(String);
