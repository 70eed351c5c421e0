//! # HTTP API Adapter
//!
//! Implements `ApiProvider` against GitHub, PyPI, the npm registry and
//! OpenWeatherMap with a shared `reqwest` client.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::domain::config::ApisConfig;
use crate::domain::traits::{
    ApiProvider, Lookup, NpmPackage, PypiPackage, RepositoryHit, WeatherReport,
};

const GITHUB_API: &str = "https://api.github.com";
const PYPI_API: &str = "https://pypi.org/pypi";
const NPM_REGISTRY: &str = "https://registry.npmjs.org";
const WEATHER_API: &str = "https://api.openweathermap.org/data/2.5";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total_count: u64,
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    html_url: String,
}

#[derive(Debug, Deserialize)]
struct PypiResponse {
    info: PypiInfo,
}

#[derive(Debug, Deserialize)]
struct PypiInfo {
    name: String,
    package_url: String,
    summary: Option<String>,
    description: Option<String>,
    home_page: Option<String>,
    version: String,
    author: Option<String>,
    license: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwmResponse {
    name: String,
    weather: Vec<OwmCondition>,
    main: OwmMain,
    clouds: OwmClouds,
    wind: OwmWind,
}

#[derive(Debug, Deserialize)]
struct OwmCondition {
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: i64,
}

#[derive(Debug, Deserialize)]
struct OwmClouds {
    all: i64,
}

#[derive(Debug, Deserialize)]
struct OwmWind {
    speed: f64,
    #[serde(default)]
    deg: f64,
}

fn parse_search(body: &str) -> Result<Lookup<RepositoryHit>, String> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| format!("Invalid search response: {}", e))?;
    match response.items.into_iter().next() {
        Some(item) if response.total_count > 0 => Ok(Lookup::Found(RepositoryHit {
            html_url: item.html_url,
        })),
        _ => Ok(Lookup::NotFound("No matching repositories".to_string())),
    }
}

fn parse_pypi(body: &str) -> Result<PypiPackage, String> {
    let response: PypiResponse =
        serde_json::from_str(body).map_err(|e| format!("Invalid PyPI response: {}", e))?;
    let info = response.info;
    Ok(PypiPackage {
        name: info.name,
        package_url: info.package_url,
        summary: info.summary,
        description: info.description.unwrap_or_default(),
        home_page: info.home_page,
        version: info.version,
        author: info.author.filter(|a| !a.is_empty()).unwrap_or_else(|| "Unknown".to_string()),
        license: info.license.filter(|l| !l.is_empty()).unwrap_or_else(|| "Unknown".to_string()),
    })
}

/// `git+https://github.com/x/y.git` becomes `https://github.com/x/y`.
fn clean_repository_url(url: &str) -> String {
    let url = url.strip_prefix("git+").unwrap_or(url);
    url.strip_suffix(".git").unwrap_or(url).to_string()
}

/// npm documents carry either a string or an object with `name`/`url`/`type`.
fn name_or_string(value: &Value, key: &str) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => map.get(key).and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn parse_npm(body: &str) -> Result<Lookup<NpmPackage>, String> {
    let doc: Value =
        serde_json::from_str(body).map_err(|e| format!("Invalid npm response: {}", e))?;
    if let Some(error) = doc.get("error").and_then(Value::as_str) {
        return Ok(Lookup::NotFound(error.to_string()));
    }

    let text = |key: &str| doc.get(key).and_then(Value::as_str).map(str::to_string);
    let name = text("name").ok_or_else(|| "npm document without a name".to_string())?;
    let maintainers = doc
        .get("maintainers")
        .and_then(Value::as_array)
        .map(|list| list.iter().filter_map(|m| name_or_string(m, "name")).collect())
        .unwrap_or_default();

    Ok(Lookup::Found(NpmPackage {
        name,
        description: text("description").unwrap_or_default(),
        homepage: text("homepage").filter(|h| !h.is_empty()),
        author: doc.get("author").and_then(|a| name_or_string(a, "name")),
        repository: doc
            .get("repository")
            .and_then(|r| name_or_string(r, "url"))
            .map(|url| clean_repository_url(&url)),
        maintainers,
        license: doc.get("license").and_then(|l| name_or_string(l, "type")),
    }))
}

/// OpenWeatherMap reports `cod` as a number on success and a string on errors.
fn response_code(doc: &Value) -> Option<i64> {
    match doc.get("cod")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn parse_weather(body: &str) -> Result<Lookup<WeatherReport>, String> {
    let doc: Value =
        serde_json::from_str(body).map_err(|e| format!("Invalid weather response: {}", e))?;
    match response_code(&doc) {
        Some(404) => {
            let message = doc
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("city not found");
            return Ok(Lookup::NotFound(message.to_string()));
        }
        Some(200) => {}
        other => {
            let message = doc.get("message").and_then(Value::as_str).unwrap_or_default();
            return Err(format!("Weather API returned {:?}: {}", other, message));
        }
    }

    let response: OwmResponse =
        serde_json::from_value(doc).map_err(|e| format!("Invalid weather response: {}", e))?;
    let condition = response
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| "Weather response without conditions".to_string())?;
    Ok(Lookup::Found(WeatherReport {
        city: response.name,
        description: condition.description,
        icon: condition.icon,
        temp_f: response.main.temp,
        humidity: response.main.humidity,
        cloudiness: response.clouds.all,
        wind_speed: response.wind.speed,
        wind_deg: response.wind.deg,
    }))
}

pub struct HttpApis {
    client: Client,
    github_api: String,
    github_token: Option<String>,
    weather_api: String,
    weather_key: Option<String>,
}

impl HttpApis {
    pub fn new(config: &ApisConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        let weather_key = config.weather.resolve_key();
        if weather_key.is_none() {
            tracing::warn!("No weather API key configured; the weather command will fail");
        }

        Ok(Self {
            client,
            github_api: config
                .github
                .endpoint
                .clone()
                .unwrap_or_else(|| GITHUB_API.to_string()),
            github_token: config.github.resolve_key(),
            weather_api: config
                .weather
                .endpoint
                .clone()
                .unwrap_or_else(|| WEATHER_API.to_string()),
            weather_key,
        })
    }

    async fn fetch(&self, request: reqwest::RequestBuilder) -> Result<(StatusCode, String), String> {
        let response = request
            .send()
            .await
            .map_err(|e| format!("HTTP request failed: {}", e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("Failed to read response body: {}", e))?;
        tracing::debug!("HTTP {} ({} bytes)", status, body.len());
        Ok((status, body))
    }
}

#[async_trait]
impl ApiProvider for HttpApis {
    async fn search_repositories(&self, query: &str) -> Result<Lookup<RepositoryHit>, String> {
        let mut request = self
            .client
            .get(format!("{}/search/repositories", self.github_api))
            .query(&[("q", query)])
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.github_token {
            request = request.bearer_auth(token);
        }

        let (status, body) = self.fetch(request).await?;
        if !status.is_success() {
            return Err(format!("GitHub search returned {}", status));
        }
        parse_search(&body)
    }

    async fn pypi_package(&self, name: &str) -> Result<Lookup<PypiPackage>, String> {
        let request = self.client.get(format!("{}/{}/json", PYPI_API, name));
        let (status, body) = self.fetch(request).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(Lookup::NotFound(name.to_string()));
        }
        if !status.is_success() {
            return Err(format!("PyPI returned {}", status));
        }
        parse_pypi(&body).map(Lookup::Found)
    }

    async fn npm_package(&self, name: &str) -> Result<Lookup<NpmPackage>, String> {
        let request = self.client.get(format!("{}/{}", NPM_REGISTRY, name));
        // The registry answers unknown packages with 404 and an `error` body.
        let (status, body) = self.fetch(request).await?;
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(format!("npm registry returned {}", status));
        }
        parse_npm(&body)
    }

    async fn current_weather(&self, query: &str) -> Result<Lookup<WeatherReport>, String> {
        let key = self
            .weather_key
            .as_deref()
            .ok_or_else(|| "No weather API key configured".to_string())?;
        let request = self
            .client
            .get(format!("{}/weather", self.weather_api))
            .query(&[("q", query), ("appid", key), ("units", "imperial")]);
        let (_, body) = self.fetch(request).await?;
        parse_weather(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_takes_first_item() {
        let body = r#"{"total_count": 2, "items": [
            {"html_url": "https://github.com/rust-lang/rust"},
            {"html_url": "https://github.com/other/rust"}
        ]}"#;
        assert_eq!(
            parse_search(body).unwrap(),
            Lookup::Found(RepositoryHit {
                html_url: "https://github.com/rust-lang/rust".into()
            })
        );
        assert!(matches!(
            parse_search(r#"{"total_count": 0, "items": []}"#).unwrap(),
            Lookup::NotFound(_)
        ));
    }

    #[test]
    fn test_pypi_fills_missing_author_and_license() {
        let body = r#"{"info": {
            "name": "requests", "package_url": "https://pypi.org/project/requests/",
            "summary": "HTTP for Humans.", "description": "long text",
            "home_page": "", "version": "2.32.3", "author": "", "license": null
        }}"#;
        let package = parse_pypi(body).unwrap();
        assert_eq!(package.name, "requests");
        assert_eq!(package.author, "Unknown");
        assert_eq!(package.license, "Unknown");
        assert_eq!(package.home_page.as_deref(), Some(""));
    }

    #[test]
    fn test_npm_error_body_is_not_found() {
        assert_eq!(
            parse_npm(r#"{"error": "Not found"}"#).unwrap(),
            Lookup::NotFound("Not found".into())
        );
    }

    #[test]
    fn test_npm_document() {
        let body = r#"{
            "name": "left-pad", "description": "String left pad",
            "homepage": "https://github.com/stevemao/left-pad#readme",
            "author": {"name": "azer"},
            "repository": {"type": "git", "url": "git+https://github.com/stevemao/left-pad.git"},
            "maintainers": [{"name": "azer"}, {"name": "stevemao"}],
            "license": "WTFPL"
        }"#;
        let Lookup::Found(package) = parse_npm(body).unwrap() else {
            panic!("expected a package");
        };
        assert_eq!(package.author.as_deref(), Some("azer"));
        assert_eq!(
            package.repository.as_deref(),
            Some("https://github.com/stevemao/left-pad")
        );
        assert_eq!(package.maintainers, vec!["azer", "stevemao"]);
        assert_eq!(package.license.as_deref(), Some("WTFPL"));
    }

    #[test]
    fn test_repository_url_cleanup() {
        assert_eq!(clean_repository_url("git+https://x.org/a/b.git"), "https://x.org/a/b");
        assert_eq!(clean_repository_url("https://x.org/a/b"), "https://x.org/a/b");
    }

    #[test]
    fn test_weather_codes() {
        let missing = r#"{"cod": "404", "message": "city not found"}"#;
        assert_eq!(
            parse_weather(missing).unwrap(),
            Lookup::NotFound("city not found".into())
        );

        let unauthorized = r#"{"cod": 401, "message": "Invalid API key"}"#;
        assert!(parse_weather(unauthorized).is_err());

        let body = r#"{
            "cod": 200, "name": "Paris",
            "weather": [{"description": "light rain", "icon": "10d"}],
            "main": {"temp": 50.0, "humidity": 80},
            "clouds": {"all": 75},
            "wind": {"speed": 9.2, "deg": 230}
        }"#;
        let Lookup::Found(report) = parse_weather(body).unwrap() else {
            panic!("expected a report");
        };
        assert_eq!(report.city, "Paris");
        assert_eq!(report.icon, "10d");
        assert_eq!(report.wind_deg, 230.0);
    }
}
