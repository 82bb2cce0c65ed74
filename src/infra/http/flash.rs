//! One-shot notices carried across a redirect in a short-lived cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use time::Duration;
use tracing::debug;

use crate::presentation::views::FlashView;

pub const FLASH_COOKIE: &str = "bbs_flash";
const FLASH_MAX_AGE: Duration = Duration::minutes(5);

/// Queue `flash` for the next rendered page.
pub fn set_flash(jar: CookieJar, flash: FlashView) -> CookieJar {
    let Ok(json) = serde_json::to_vec(&flash) else {
        return jar;
    };

    let cookie = Cookie::build((FLASH_COOKIE, URL_SAFE_NO_PAD.encode(json)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(FLASH_MAX_AGE)
        .build();
    jar.add(cookie)
}

/// Consume the pending flash, if any, clearing the cookie.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<FlashView>) {
    let Some(value) = jar.get(FLASH_COOKIE).map(|cookie| cookie.value().to_string()) else {
        return (jar, None);
    };

    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, decode(&value))
}

fn decode(value: &str) -> Option<FlashView> {
    let flash = URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<FlashView>(&bytes).ok());

    if flash.is_none() {
        debug!(target = "bbs::http::flash", "discarding malformed flash cookie");
    }
    flash
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::views::FlashKind;

    #[test]
    fn flash_survives_the_cookie_trip() {
        let jar = set_flash(CookieJar::new(), FlashView::error("Wrong password"));
        let cookie = jar.get(FLASH_COOKIE).expect("cookie set");
        assert!(cookie.http_only().unwrap_or(false));

        let (jar, flash) = take_flash(jar);
        let flash = flash.expect("flash decoded");
        assert_eq!(flash.kind, FlashKind::Error);
        assert_eq!(flash.message, "Wrong password");
        assert!(jar.get(FLASH_COOKIE).is_none());
    }

    #[test]
    fn success_kind_is_kept() {
        let jar = set_flash(CookieJar::new(), FlashView::success("Post created."));
        let (_, flash) = take_flash(jar);
        assert_eq!(flash.map(|flash| flash.kind), Some(FlashKind::Success));
    }

    #[test]
    fn malformed_cookie_is_ignored() {
        let jar = CookieJar::new().add(Cookie::new(FLASH_COOKIE, "not base64 json"));
        let (_, flash) = take_flash(jar);
        assert!(flash.is_none());
    }

    #[test]
    fn missing_cookie_yields_nothing() {
        let (_, flash) = take_flash(CookieJar::new());
        assert!(flash.is_none());
    }
}
