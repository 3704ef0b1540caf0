use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A catalog movie record. Favorites store these verbatim, so every field
/// must survive a serialize/deserialize round trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_average: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub vote_count: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub popularity: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub original_language: String,
    #[serde(default)]
    pub release_date: Option<String>,
}

/// The catalog sends `null` for some scalar fields on sparse records.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Movie {
    pub fn release_date(&self) -> Option<NaiveDate> {
        self.release_date
            .as_deref()
            .filter(|d| !d.is_empty())
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }

    /// "Tue Mar 01 2022", or "N/A" when the date is missing or unparsable.
    pub fn release_date_label(&self) -> String {
        self.release_date()
            .map(|d| d.format("%a %b %d %Y").to_string())
            .unwrap_or_else(|| "N/A".to_string())
    }

    pub fn rating_label(&self) -> String {
        format!("{:.1}", self.vote_average)
    }

    pub fn popularity_label(&self) -> String {
        format!("{:.2}", self.popularity)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

/// One page of a paged catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoviePage {
    #[serde(default = "first_page")]
    pub page: u32,
    pub results: Vec<Movie>,
    #[serde(default)]
    pub total_pages: u32,
    #[serde(default)]
    pub total_results: u32,
}

fn first_page() -> u32 {
    1
}

impl MoviePage {
    pub fn of(results: Vec<Movie>) -> Self {
        Self {
            page: 1,
            total_pages: 1,
            total_results: results.len() as u32,
            results,
        }
    }
}

/// Which image field renders a movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverType {
    #[default]
    Poster,
    Backdrop,
}

impl CoverType {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "poster" => Some(CoverType::Poster),
            "backdrop" => Some(CoverType::Backdrop),
            _ => None,
        }
    }

    pub fn path<'a>(&self, movie: &'a Movie) -> Option<&'a str> {
        match self {
            CoverType::Poster => movie.poster_path.as_deref(),
            CoverType::Backdrop => movie.backdrop_path.as_deref(),
        }
    }

    pub fn image_url(&self, image_base: &str, movie: &Movie) -> Option<String> {
        self.path(movie)
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}{}", image_base.trim_end_matches('/'), p))
    }
}

/// The fixed catalog listings shown on the home screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    NowPlaying,
    Upcoming,
    TopRated,
    Popular,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::NowPlaying,
        Category::Upcoming,
        Category::TopRated,
        Category::Popular,
    ];

    pub fn as_path(&self) -> &'static str {
        match self {
            Category::NowPlaying => "now_playing",
            Category::Upcoming => "upcoming",
            Category::TopRated => "top_rated",
            Category::Popular => "popular",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_path() == input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn movie(id: i32) -> Movie {
        Movie {
            id,
            title: format!("Movie {id}"),
            poster_path: Some(format!("/poster{id}.jpg")),
            backdrop_path: None,
            overview: "Overview".to_string(),
            vote_average: 7.26,
            vote_count: 1200,
            popularity: 88.123,
            original_language: "en".to_string(),
            release_date: Some("2022-03-01".to_string()),
        }
    }

    #[test]
    fn favorite_list_round_trips_field_for_field() {
        let list = vec![movie(3), movie(1), movie(2)];
        let blob = serde_json::to_string(&list).expect("serialize");
        let back: Vec<Movie> = serde_json::from_str(&blob).expect("deserialize");
        assert_eq!(back, list);
    }

    #[test]
    fn deserializes_catalog_result_and_ignores_unknown_fields() {
        let value = json!({
            "adult": false,
            "backdrop_path": "/back.jpg",
            "genre_ids": [878, 12],
            "id": 438631,
            "original_language": "en",
            "original_title": "Dune",
            "overview": "Paul Atreides...",
            "popularity": 120.5,
            "poster_path": "/dune.jpg",
            "release_date": "2021-09-15",
            "title": "Dune",
            "video": false,
            "vote_average": 7.8,
            "vote_count": 12000
        });
        let m: Movie = serde_json::from_value(value).expect("movie");
        assert_eq!(m.id, 438631);
        assert_eq!(m.backdrop_path.as_deref(), Some("/back.jpg"));
        assert_eq!(m.vote_count, 12000);
    }

    #[test]
    fn null_scalars_fall_back_to_defaults() {
        let value = json!({
            "id": 77,
            "title": "Obscure Short",
            "poster_path": null,
            "overview": null,
            "vote_average": null,
            "vote_count": null,
            "popularity": null,
            "original_language": null,
            "release_date": null
        });
        let m: Movie = serde_json::from_value(value).expect("movie with nulls");
        assert_eq!(m.overview, "");
        assert_eq!(m.original_language, "");
        assert_eq!(m.vote_average, 0.0);
        assert_eq!(m.vote_count, 0);
        assert_eq!(m.poster_path, None);
        assert_eq!(m.release_date_label(), "N/A");

        let page: MoviePage = serde_json::from_value(json!({
            "results": [{ "id": 1, "title": "A", "overview": null }]
        }))
        .expect("page with null overview");
        assert_eq!(page.results[0].overview, "");
    }

    #[test]
    fn rejects_record_without_title() {
        let value = json!({ "id": 1 });
        assert!(serde_json::from_value::<Movie>(value).is_err());
    }

    #[test]
    fn labels_release_date_and_numbers() {
        let m = movie(1);
        assert_eq!(m.release_date_label(), "Tue Mar 01 2022");
        assert_eq!(m.rating_label(), "7.3");
        assert_eq!(m.popularity_label(), "88.12");

        let mut undated = movie(2);
        undated.release_date = Some(String::new());
        assert_eq!(undated.release_date_label(), "N/A");
        undated.release_date = None;
        assert_eq!(undated.release_date_label(), "N/A");
    }

    #[test]
    fn cover_type_selects_image_field() {
        let m = movie(7);
        let base = "https://image.tmdb.org/t/p/w500";
        assert_eq!(
            CoverType::Poster.image_url(base, &m).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/poster7.jpg")
        );
        assert_eq!(CoverType::Backdrop.image_url(base, &m), None);
        assert_eq!(CoverType::parse("Backdrop"), Some(CoverType::Backdrop));
        assert_eq!(CoverType::parse("banner"), None);
    }

    #[test]
    fn category_paths_round_trip() {
        for c in Category::ALL {
            assert_eq!(Category::parse(c.as_path()), Some(c));
        }
        assert_eq!(Category::parse("trending"), None);
    }
}
