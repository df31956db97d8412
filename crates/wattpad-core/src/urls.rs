// URL builders for the story, part, search and browse endpoints.
//
// Every builder takes the base URL explicitly so the client can be pointed at
// a mirror or a local test server.

use reqwest::Url;

use crate::constants::BASE_URL;
use crate::error::{Result, WattpadError};

// ---------------------------------------------------------------------------
// Field selectors
// ---------------------------------------------------------------------------

pub const STORY_DETAIL_FIELDS: &str = "id,title,description,url,cover,user(name,username,avatar),isPaywalled,lastPublishedPart(id,createDate),parts(id,title,text_url),tags";

pub const PART_DETAIL_FIELDS: &str = concat!(
    "text_url,group(",
    "id,title,description,url,cover,user(name,username,avatar),isPaywalled,lastPublishedPart(id,createDate),parts(id,title,text_url),tags",
    ")"
);

pub const STORY_SEARCH_FIELDS: &str = "stories(id,title,voteCount,readCount,commentCount,description,mature,completed,cover,url,numParts,isPaywalled,paidModel,length,language(id),user(name),lastPublishedPart(createDate),promoted,sponsor(name,avatar),tags,tracking(clickUrl,impressionUrl,thirdParty(impressionUrls,clickUrls)),contest(endDate,ctaLabel,ctaURL)),total,tags,nextUrl";

pub const USER_SEARCH_FIELDS: &str =
    "users(username,name,avatar,description,numLists,numFollowers,numStoriesPublished,badges,following)";

pub const BROWSE_TOPICS_FIELDS: &str = "topics(name,categoryID,browseURL,tagURL)";

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// The production base URL.
pub fn default_base() -> Url {
    // BASE_URL is a compile-time constant known to parse.
    Url::parse(BASE_URL).unwrap_or_else(|_| unreachable!("BASE_URL is a valid URL"))
}

pub fn story_by_id(base: &Url, story_id: u64) -> Url {
    let mut url = endpoint(base, &["api", "v3", "stories", &story_id.to_string()]);
    url.query_pairs_mut()
        .append_pair("fields", STORY_DETAIL_FIELDS);
    url
}

pub fn part_by_id(base: &Url, part_id: u64) -> Url {
    let mut url = endpoint(base, &["api", "v4", "parts", &part_id.to_string()]);
    url.query_pairs_mut().append_pair("fields", PART_DETAIL_FIELDS);
    url
}

/// Resolve a part's `text_url` against `base`.
///
/// The API usually hands out relative paths such as
/// `/apiv2/?m=storytext&id=1321853334`; absolute URLs are returned unchanged.
pub fn part_text(base: &Url, text_url: &str) -> Result<Url> {
    base.join(text_url).map_err(|_| WattpadError::InvalidUrl {
        part_id: None,
        url: text_url.to_string(),
    })
}

pub fn search_stories(base: &Url, query: &str, mature: bool, limit: u32) -> Url {
    let mut url = endpoint(base, &["v4", "search", "stories"]);
    url.query_pairs_mut()
        .append_pair("query", query)
        .append_pair("mature", if mature { "true" } else { "false" })
        .append_pair("limit", &limit.to_string())
        .append_pair("fields", STORY_SEARCH_FIELDS);
    url
}

pub fn search_users(base: &Url, query: &str, limit: u32, offset: u32) -> Url {
    let mut url = endpoint(base, &["v4", "search", "users"]);
    url.query_pairs_mut()
        .append_pair("query", query)
        .append_pair("limit", &limit.to_string())
        .append_pair("offset", &offset.to_string())
        .append_pair("fields", USER_SEARCH_FIELDS);
    url
}

pub fn browse_topics(base: &Url, language_id: u32) -> Url {
    let mut url = endpoint(base, &["v5", "browse", "topics"]);
    url.query_pairs_mut()
        .append_pair("language", &language_id.to_string())
        .append_pair("fields", BROWSE_TOPICS_FIELDS);
    url
}

/// Append path segments to `base`, dropping a trailing empty segment first so
/// `https://host/` and `https://host` behave the same.
fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
