//! `weather` tool — current conditions, forecast and air quality.
//!
//! Only available with the `web-tools` feature.
//!
//! Conditions and forecasts come from the wttr.in JSON format
//! (`{api_base}/{location}?format=j1&lang=zh`). Air quality comes from the
//! Open-Meteo air-quality API, located through the coordinates wttr.in
//! reports for the place.
//!
//! An empty location lets wttr.in pick one from the caller's IP address.

use addy_domain::{DateSpec, Entities, ExecutionResult, Intent, Tool, ToolDescriptor, ToolError};
use async_trait::async_trait;
use serde_json::{Value, json};

use super::http_client;

/// Canonical tool name.
pub const WEATHER: &str = "weather";

/// wttr.in reports today plus two days.
const MAX_FORECAST_DAYS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherToolConfig {
    pub api_base: String,
    pub air_quality_api: String,
    pub default_location: Option<String>,
}

impl Default for WeatherToolConfig {
    fn default() -> Self {
        Self {
            api_base: "https://wttr.in".to_string(),
            air_quality_api: "https://air-quality-api.open-meteo.com/v1/air-quality".to_string(),
            default_location: None,
        }
    }
}

pub struct WeatherTool {
    descriptor: ToolDescriptor,
    config: WeatherToolConfig,
    client: reqwest::Client,
}

impl WeatherTool {
    pub fn new(config: WeatherToolConfig) -> Self {
        Self {
            descriptor: ToolDescriptor::new(WEATHER, "天气: 当前天气、天气预报、空气质量")
                .with_intents([
                    Intent::GetWeather,
                    Intent::GetWeatherForecast,
                    Intent::GetAirQuality,
                ]),
            config,
            client: http_client(),
        }
    }

    fn location(&self, entities: &Entities) -> String {
        entities
            .text("location")
            .filter(|l| !l.trim().is_empty())
            .or_else(|| self.config.default_location.clone())
            .unwrap_or_default()
    }

    async fn fetch_report(&self, location: &str) -> Result<Value, ToolError> {
        let url = format!("{}/{}", self.config.api_base.trim_end_matches('/'), location);
        tracing::debug!(%url, "Fetching weather report");

        let response = self
            .client
            .get(&url)
            .query(&[("format", "j1"), ("lang", "zh")])
            .send()
            .await
            .map_err(|e| ToolError::execution_failed(format!("Weather request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ToolError::execution_failed(format!(
                "Weather service returned {}",
                response.status()
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ToolError::execution_failed(format!("Invalid weather response: {}", e)))
    }

    async fn current(&self, entities: &Entities) -> Result<ExecutionResult, ToolError> {
        let location = self.location(entities);
        let report = self.fetch_report(&location).await?;
        let offset = day_offset(entities);

        let message = if offset == 0 {
            format_current(&display_location(&location, &report), &report)
        } else {
            format_day(&display_location(&location, &report), &report, offset)
        };
        Ok(match message {
            Some(message) => ExecutionResult::success(message)
                .with_data(json!({ "location": location, "day_offset": offset })),
            None => ExecutionResult::rejected(format!("无法获取 {} 的天气信息", location)),
        })
    }

    async fn forecast(&self, entities: &Entities) -> Result<ExecutionResult, ToolError> {
        let location = self.location(entities);
        let days = entities
            .integer("days")
            .map(|d| d.clamp(1, MAX_FORECAST_DAYS as i64) as usize)
            .unwrap_or(MAX_FORECAST_DAYS);
        let report = self.fetch_report(&location).await?;

        Ok(match format_forecast(&display_location(&location, &report), &report, days) {
            Some(message) => ExecutionResult::success(message)
                .with_data(json!({ "location": location, "days": days })),
            None => ExecutionResult::rejected(format!("无法获取 {} 的天气预报", location)),
        })
    }

    async fn air_quality(&self, entities: &Entities) -> Result<ExecutionResult, ToolError> {
        let location = self.location(entities);
        let report = self.fetch_report(&location).await?;
        let area = &report["nearest_area"][0];
        let (Some(lat), Some(lon)) = (
            area["latitude"].as_str(),
            area["longitude"].as_str(),
        ) else {
            return Ok(ExecutionResult::rejected(format!("无法定位 {}", location)));
        };

        let response = self
            .client
            .get(&self.config.air_quality_api)
            .query(&[
                ("latitude", lat),
                ("longitude", lon),
                ("current", "us_aqi,pm2_5,pm10"),
            ])
            .send()
            .await
            .map_err(|e| ToolError::execution_failed(format!("Air quality request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(ToolError::execution_failed(format!(
                "Air quality service returned {}",
                response.status()
            )));
        }
        let data: Value = response
            .json()
            .await
            .map_err(|e| ToolError::execution_failed(format!("Invalid air quality response: {}", e)))?;

        Ok(match format_air_quality(&display_location(&location, &report), &data) {
            Some(message) => ExecutionResult::success(message).with_data(data["current"].clone()),
            None => ExecutionResult::rejected(format!("无法获取 {} 的空气质量", location)),
        })
    }
}

fn day_offset(entities: &Entities) -> usize {
    match entities.datetime("day").map(|dt| dt.date) {
        Some(DateSpec::Relative { days }) if days > 0 => days as usize,
        _ => 0,
    }
}

fn display_location(requested: &str, report: &Value) -> String {
    if !requested.is_empty() {
        return requested.to_string();
    }
    report["nearest_area"][0]["areaName"][0]["value"]
        .as_str()
        .unwrap_or("当前位置")
        .to_string()
}

/// Chinese description when wttr.in provides one.
fn description(entry: &Value) -> &str {
    entry["lang_zh"][0]["value"]
        .as_str()
        .or_else(|| entry["weatherDesc"][0]["value"].as_str())
        .unwrap_or("未知")
}

fn format_current(location: &str, report: &Value) -> Option<String> {
    let current = report["current_condition"].get(0)?;
    let temp = current["temp_C"].as_str()?;
    let mut message = format!("{}当前天气: {}，气温 {}°C", location, description(current), temp);
    if let Some(feels) = current["FeelsLikeC"].as_str() {
        message.push_str(&format!("，体感 {}°C", feels));
    }
    if let Some(humidity) = current["humidity"].as_str() {
        message.push_str(&format!("，湿度 {}%", humidity));
    }
    if let Some(wind) = current["windspeedKmph"].as_str() {
        message.push_str(&format!("，风速 {} 公里/小时", wind));
    }
    Some(message)
}

fn day_label(offset: usize) -> String {
    match offset {
        0 => "今天".to_string(),
        1 => "明天".to_string(),
        2 => "后天".to_string(),
        n => format!("{}天后", n),
    }
}

fn format_day(location: &str, report: &Value, offset: usize) -> Option<String> {
    let day = report["weather"].get(offset)?;
    // midday slot
    let noon = day["hourly"].get(4).unwrap_or(&Value::Null);
    Some(format!(
        "{}{}天气: {}，{}°C ~ {}°C",
        location,
        day_label(offset),
        description(noon),
        day["mintempC"].as_str()?,
        day["maxtempC"].as_str()?
    ))
}

fn format_forecast(location: &str, report: &Value, days: usize) -> Option<String> {
    let available = report["weather"].as_array()?;
    if available.is_empty() {
        return None;
    }
    let mut message = format!("{}未来{}天天气预报:", location, days.min(available.len()));
    for (offset, day) in available.iter().take(days).enumerate() {
        let noon = day["hourly"].get(4).unwrap_or(&Value::Null);
        message.push_str(&format!(
            "\n{} ({}): {}，{}°C ~ {}°C",
            day_label(offset),
            day["date"].as_str().unwrap_or(""),
            description(noon),
            day["mintempC"].as_str().unwrap_or("?"),
            day["maxtempC"].as_str().unwrap_or("?")
        ));
    }
    Some(message)
}

/// US AQI category.
fn aqi_level(aqi: f64) -> &'static str {
    match aqi as u32 {
        0..=50 => "优",
        51..=100 => "良",
        101..=150 => "轻度污染",
        151..=200 => "中度污染",
        201..=300 => "重度污染",
        _ => "严重污染",
    }
}

fn format_air_quality(location: &str, data: &Value) -> Option<String> {
    let current = &data["current"];
    let aqi = current["us_aqi"].as_f64()?;
    let mut message = format!(
        "{}空气质量: {} (AQI {})",
        location,
        aqi_level(aqi),
        aqi.round()
    );
    if let Some(pm25) = current["pm2_5"].as_f64() {
        message.push_str(&format!("，PM2.5 {:.0}", pm25));
    }
    if let Some(pm10) = current["pm10"].as_f64() {
        message.push_str(&format!("，PM10 {:.0}", pm10));
    }
    Some(message)
}

#[async_trait]
impl Tool for WeatherTool {
    fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }

    async fn execute(
        &self,
        intent: Intent,
        entities: &Entities,
        _raw_text: &str,
    ) -> Result<ExecutionResult, ToolError> {
        match intent {
            Intent::GetWeather => self.current(entities).await,
            Intent::GetWeatherForecast => self.forecast(entities).await,
            Intent::GetAirQuality => self.air_quality(entities).await,
            other => Ok(ExecutionResult::rejected(format!("不支持的天气操作: {}", other))),
        }
    }
}
