use crate::domain::model::LoginCredentials;
use crate::domain::ports::LoginLocale;
use crate::utils::error::{Result, StoryError};
use crate::utils::validation::{
    validate_dir_path, validate_file_path, validate_non_empty_string, validate_range,
    validate_required_field, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const NEIS_API_KEY_ENV: &str = "NEIS_API_KEY";
pub const IG_USERNAME_ENV: &str = "IG_USERNAME";
pub const IG_PASSWORD_ENV: &str = "IG_PASSWORD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub school: SchoolConfig,
    pub assets: AssetsConfig,
    pub output: OutputConfig,
    pub layout: LayoutConfig,
    pub publisher: PublisherConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://open.neis.go.kr/hub/mealServiceDietInfo".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchoolConfig {
    /// 시도교육청코드
    pub office_code: String,
    /// 행정표준코드
    pub school_code: String,
}

impl Default for SchoolConfig {
    fn default() -> Self {
        Self {
            office_code: "K10".to_string(),
            school_code: "7801152".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    pub background: PathBuf,
    pub font: PathBuf,
    pub fallback_fonts: Vec<PathBuf>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            background: PathBuf::from("assets/sokgo.png"),
            font: PathBuf::from("assets/Pretendard-Bold.otf"),
            fallback_fonts: platform_fallback_fonts(),
        }
    }
}

/// 各平台預設字型，依序嘗試
fn platform_fallback_fonts() -> Vec<PathBuf> {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/System/Library/Fonts/AppleSDGothicNeo.ttc",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/Library/Fonts/Arial.ttf",
        ]
    } else if cfg!(target_os = "windows") {
        &[
            "C:\\Windows\\Fonts\\malgunbd.ttf",
            "C:\\Windows\\Fonts\\malgun.ttf",
            "C:\\Windows\\Fonts\\arial.ttf",
        ]
    } else {
        &[
            "/usr/share/fonts/truetype/nanum/NanumGothicBold.ttf",
            "/usr/share/fonts/opentype/noto/NotoSansCJK-Bold.ttc",
            "/usr/share/fonts/noto-cjk/NotoSansCJK-Bold.ttc",
            "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        ]
    };
    candidates.iter().map(PathBuf::from).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("outputs"),
            jpeg_quality: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub date_font_size: f32,
    pub label_font_size: f32,
    pub body_font_size: f32,
    pub text_color: [u8; 3],
    /// 日期區塊的起始高度
    pub title_y: i32,
    pub date_gap: i32,
    pub label_gap: i32,
    pub body_gap: i32,
    pub line_height: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            date_font_size: 30.0,
            label_font_size: 36.0,
            body_font_size: 32.0,
            text_color: [0, 0, 0],
            title_y: 150,
            date_gap: 20,
            label_gap: 50,
            body_gap: 40,
            line_height: 45,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    pub base_url: String,
    pub session_file: PathBuf,
    pub username: Option<String>,
    pub password: Option<String>,
    pub locale: String,
    pub country: String,
    pub timezone_offset: i32,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://i.instagram.com/api/v1".to_string(),
            session_file: PathBuf::from("session.json"),
            username: None,
            password: None,
            locale: "ko_KR".to_string(),
            country: "KR".to_string(),
            timezone_offset: 9 * 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// "compact" 或 "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: "compact".to_string(),
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(StoryError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| StoryError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${NEIS_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| StoryError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 用環境變數覆蓋金鑰與帳號
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(NEIS_API_KEY_ENV).filter(|v| !v.is_empty()) {
            self.api.api_key = Some(key);
        }
        if let Some(username) = lookup(IG_USERNAME_ENV).filter(|v| !v.is_empty()) {
            self.publisher.username = Some(username);
        }
        if let Some(password) = lookup(IG_PASSWORD_ENV).filter(|v| !v.is_empty()) {
            self.publisher.password = Some(password);
        }
    }

    pub fn api_key(&self) -> Result<&str> {
        validate_required_field(NEIS_API_KEY_ENV, &self.api.api_key)
    }

    pub fn login_credentials(&self) -> Result<LoginCredentials> {
        Ok(LoginCredentials {
            username: validate_required_field(IG_USERNAME_ENV, &self.publisher.username)?
                .to_string(),
            password: validate_required_field(IG_PASSWORD_ENV, &self.publisher.password)?
                .to_string(),
        })
    }

    pub fn login_locale(&self) -> LoginLocale {
        LoginLocale {
            locale: self.publisher.locale.clone(),
            country: self.publisher.country.clone(),
            timezone_offset: self.publisher.timezone_offset,
        }
    }

    pub fn json_logging(&self) -> bool {
        self.logging.format.eq_ignore_ascii_case("json")
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api.base_url", &self.api.base_url)?;
        validate_url("publisher.base_url", &self.publisher.base_url)?;

        validate_non_empty_string("school.office_code", &self.school.office_code)?;
        validate_non_empty_string("school.school_code", &self.school.school_code)?;

        validate_file_path("assets.background", &self.assets.background)?;
        validate_file_path("assets.font", &self.assets.font)?;
        validate_dir_path("output.dir", &self.output.dir)?;
        validate_file_path("publisher.session_file", &self.publisher.session_file)?;

        validate_range("output.jpeg_quality", self.output.jpeg_quality, 1, 100)?;
        validate_range("layout.date_font_size", self.layout.date_font_size, 1.0, 400.0)?;
        validate_range("layout.label_font_size", self.layout.label_font_size, 1.0, 400.0)?;
        validate_range("layout.body_font_size", self.layout.body_font_size, 1.0, 400.0)?;
        validate_range("layout.line_height", self.layout.line_height, 1, 1000)?;

        match self.logging.format.to_ascii_lowercase().as_str() {
            "compact" | "json" => {}
            other => {
                return Err(StoryError::InvalidConfigValueError {
                    field: "logging.format".to_string(),
                    value: other.to_string(),
                    reason: "Valid formats: compact, json".to_string(),
                })
            }
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_school() {
        let config = AppConfig::default();
        assert_eq!(config.school.office_code, "K10");
        assert_eq!(config.school.school_code, "7801152");
        assert_eq!(config.layout.title_y, 150);
        assert_eq!(config.layout.line_height, 45);
        assert_eq!(config.output.dir, PathBuf::from("outputs"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_content = r#"
[school]
school_code = "7010000"

[layout]
body_font_size = 28.0

[output]
dir = "/tmp/meal-outputs"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.school.school_code, "7010000");
        assert_eq!(config.school.office_code, "K10");
        assert_eq!(config.layout.body_font_size, 28.0);
        assert_eq!(config.layout.date_font_size, 30.0);
        assert_eq!(config.output.dir, PathBuf::from("/tmp/meal-outputs"));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MEAL_STORY_TEST_BASE", "https://neis.test.local/hub");

        let toml_content = r#"
[api]
base_url = "${MEAL_STORY_TEST_BASE}"
"#;

        let config = AppConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api.base_url, "https://neis.test.local/hub");

        std::env::remove_var("MEAL_STORY_TEST_BASE");
    }

    #[test]
    fn test_apply_env_overlays_secrets() {
        let env: HashMap<&str, &str> = HashMap::from([
            (NEIS_API_KEY_ENV, "neis-key"),
            (IG_USERNAME_ENV, "sokgo_meal"),
            (IG_PASSWORD_ENV, ""),
        ]);

        let mut config = AppConfig::default();
        config.publisher.password = Some("from-file".to_string());
        config.apply_env_with(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_key().unwrap(), "neis-key");
        let creds = config.login_credentials().unwrap();
        assert_eq!(creds.username, "sokgo_meal");
        // 空字串不覆蓋
        assert_eq!(creds.password, "from-file");
    }

    #[test]
    fn test_missing_credentials() {
        let config = AppConfig::default();
        assert!(matches!(
            config.api_key(),
            Err(StoryError::MissingConfigError { .. })
        ));
        assert!(config.login_credentials().is_err());
    }

    #[test]
    fn test_config_validation() {
        let config = AppConfig::from_toml_str(
            r#"
[api]
base_url = "invalid-url"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::from_toml_str(
            r#"
[output]
jpeg_quality = 0
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = AppConfig::from_toml_str(
            r#"
[logging]
format = "xml"
"#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[publisher]\nsession_file = \"state/session.json\"\n")
            .unwrap();

        let config = AppConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(
            config.publisher.session_file,
            PathBuf::from("state/session.json")
        );
    }
}
