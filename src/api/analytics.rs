//! Click analytics for a single link.

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	api::{
		Client,
		links::{link_path, parse_ids},
	},
	error::ValidationError,
	http::ApiHttpClient,
};

/// Closed-open window `[from, to)` an analytics query covers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeRange {
	from: OffsetDateTime,
	to: OffsetDateTime,
}
impl TimeRange {
	/// Builds a range; `to` must not precede `from`.
	pub fn new(from: OffsetDateTime, to: OffsetDateTime) -> Result<Self, ValidationError> {
		if to < from {
			return Err(ValidationError::InvertedRange);
		}

		Ok(Self { from, to })
	}

	/// Range ending at `to` and spanning `span` backwards.
	pub fn ending_at(to: OffsetDateTime, span: Duration) -> Result<Self, ValidationError> {
		let from = to
			.checked_sub(span.abs())
			.ok_or(ValidationError::UnrepresentableTimestamp { field: "from" })?;

		Self::new(from, to)
	}

	/// Window start.
	pub fn start(&self) -> OffsetDateTime {
		self.from
	}

	/// Window end.
	pub fn end(&self) -> OffsetDateTime {
		self.to
	}

	pub(crate) fn query(&self) -> Result<Vec<(&'static str, String)>, ValidationError> {
		Ok(vec![("from", rfc3339("from", self.from)?), ("to", rfc3339("to", self.to)?)])
	}
}

fn rfc3339(field: &'static str, at: OffsetDateTime) -> Result<String, ValidationError> {
	at.format(&Rfc3339).map_err(|_| ValidationError::UnrepresentableTimestamp { field })
}

/// Bucket width of a click time series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interval {
	/// One bucket per hour.
	Hour,
	/// One bucket per day.
	Day,
	/// One bucket per week.
	Week,
}
impl Interval {
	/// Query-string form.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Hour => "hour",
			Self::Day => "day",
			Self::Week => "week",
		}
	}
}

/// Attribute clicks can be grouped by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
	/// Visitor country.
	Country,
	/// Referring site.
	Referrer,
	/// Device class.
	Device,
	/// Browser family.
	Browser,
}
impl Dimension {
	/// Query-string form.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Country => "country",
			Self::Referrer => "referrer",
			Self::Device => "device",
			Self::Browser => "browser",
		}
	}
}

/// Aggregate click counts for a link over a range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSummary {
	/// Total redirects served.
	pub total_clicks: u64,
	/// Distinct visitors.
	pub unique_visitors: u64,
	/// Most recent click, if any.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub last_click_at: Option<OffsetDateTime>,
}

/// One bucket of a click time series.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
	/// Bucket start.
	#[serde(with = "time::serde::rfc3339")]
	pub at: OffsetDateTime,
	/// Clicks within the bucket.
	pub clicks: u64,
}

/// One group of a click breakdown.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BreakdownEntry {
	/// Dimension value, such as a country code.
	pub key: String,
	/// Clicks attributed to the value.
	pub clicks: u64,
	/// Fraction of all clicks in the range, from `0.0` to `1.0`.
	#[serde(default)]
	pub share: f64,
}

#[derive(Deserialize)]
struct Series {
	points: Vec<SeriesPoint>,
}

#[derive(Deserialize)]
struct Breakdown {
	entries: Vec<BreakdownEntry>,
}

impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Click totals for a link.
	pub async fn link_summary(
		&self,
		project_id: &str,
		link_id: &str,
		range: &TimeRange,
	) -> Result<LinkSummary> {
		let (project, link) = parse_ids(project_id, link_id)?;
		let url = self.url_with_query(
			&format!("{}/analytics/summary", link_path(&project, &link)),
			&range.query()?,
		)?;

		self.get_json("link_summary", url).await
	}

	/// Clicks bucketed by `interval`, oldest first.
	pub async fn click_series(
		&self,
		project_id: &str,
		link_id: &str,
		range: &TimeRange,
		interval: Interval,
	) -> Result<Vec<SeriesPoint>> {
		let (project, link) = parse_ids(project_id, link_id)?;
		let mut query = range.query()?;

		query.push(("interval", interval.as_str().to_owned()));

		let url = self
			.url_with_query(&format!("{}/analytics/timeseries", link_path(&project, &link)), &query)?;
		let series: Series = self.get_json("click_series", url).await?;

		Ok(series.points)
	}

	/// Clicks grouped by `dimension`.
	pub async fn breakdown(
		&self,
		project_id: &str,
		link_id: &str,
		range: &TimeRange,
		dimension: Dimension,
	) -> Result<Vec<BreakdownEntry>> {
		let (project, link) = parse_ids(project_id, link_id)?;
		let mut query = range.query()?;

		query.push(("dimension", dimension.as_str().to_owned()));

		let url = self
			.url_with_query(&format!("{}/analytics/breakdown", link_path(&project, &link)), &query)?;
		let breakdown: Breakdown = self.get_json("breakdown", url).await?;

		Ok(breakdown.entries)
	}
}
