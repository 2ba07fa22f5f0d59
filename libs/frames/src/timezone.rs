//! Server timezone lookup for date/time columns.

use std::future::Future;
use std::pin::Pin;

use chrono_tz::Tz;

use crate::error::Error;

pub type TimezoneFuture<'a> = Pin<Box<dyn Future<Output = Result<Tz, Error>> + Send + 'a>>;

/// Supplies the timezone ClickHouse uses to render `DateTime` values.
///
/// Implementations usually ask the server (`SELECT timezone()`), so
/// [`crate::Response::to_frames`] calls this at most once per response.
pub trait TimezoneSource: Send + Sync {
    fn fetch_timezone(&self) -> TimezoneFuture<'_>;
}

/// A fixed, already known timezone.
impl TimezoneSource for Tz {
    fn fetch_timezone(&self) -> TimezoneFuture<'_> {
        let tz = *self;
        Box::pin(async move { Ok(tz) })
    }
}

/// Fetch the timezone, falling back to UTC if the lookup fails.
pub async fn resolve_timezone<S>(source: &S) -> Tz
where
    S: TimezoneSource + ?Sized,
{
    match source.fetch_timezone().await {
        Ok(tz) => tz,
        Err(e) => {
            tracing::warn!(error = %e, "unable to fetch server timezone, using UTC");
            Tz::UTC
        }
    }
}

/// Parse an IANA zone name such as `Europe/Moscow`.
pub fn parse_timezone(name: &str) -> Result<Tz, Error> {
    let name = name.trim();
    name.parse()
        .map_err(|_| Error::timezone(format!("unknown timezone `{name}`")))
}

#[cfg(test)]
mod tests {
    use chrono_tz::Tz;

    use super::{TimezoneFuture, TimezoneSource, parse_timezone, resolve_timezone};
    use crate::error::Error;

    struct Unreachable;

    impl TimezoneSource for Unreachable {
        fn fetch_timezone(&self) -> TimezoneFuture<'_> {
            Box::pin(async { Err(Error::timezone("connection refused")) })
        }
    }

    #[tokio::test]
    async fn failed_lookup_falls_back_to_utc() {
        assert_eq!(resolve_timezone(&Unreachable).await, Tz::UTC);
    }

    #[tokio::test]
    async fn fixed_zone_resolves_to_itself() {
        assert_eq!(resolve_timezone(&Tz::Asia__Tokyo).await, Tz::Asia__Tokyo);
    }

    #[test]
    fn parses_zone_names() {
        assert_eq!(parse_timezone(" Europe/Moscow ").unwrap(), Tz::Europe__Moscow);
        assert!(parse_timezone("Mars/Olympus").is_err());
    }
}
