use super::*;

fn small() -> FractalConfig {
    FractalConfig {
        width: 64,
        height: 48,
        threads: 2,
        ..FractalConfig::default()
    }
}

#[test]
fn default_config_is_valid() {
    FractalConfig::default().validate().unwrap();
}

#[test]
fn validation_catches_bad_values() {
    assert!(
        FractalConfig {
            width: 0,
            ..small()
        }
        .validate()
        .is_err()
    );
    assert!(
        FractalConfig {
            max_iterations: 0,
            ..small()
        }
        .validate()
        .is_err()
    );
    assert!(
        FractalConfig {
            threads: 0,
            ..small()
        }
        .validate()
        .is_err()
    );
    assert!(
        FractalConfig {
            zoom: 0.0,
            ..small()
        }
        .validate()
        .is_err()
    );
    assert!(
        FractalConfig {
            julia_x: f64::NAN,
            ..small()
        }
        .validate()
        .is_err()
    );
}

#[test]
fn active_zoom_follows_mode() {
    let mut cfg = small();
    cfg.set_active_zoom(4.0);
    assert_eq!(cfg.zoom, 4.0);
    assert_eq!(cfg.active_zoom(), 4.0);

    cfg.use_julia = true;
    cfg.set_active_zoom(9.0);
    assert_eq!(cfg.julia_zoom, 9.0);
    assert_eq!(cfg.zoom, 4.0);
    assert_eq!(cfg.active_zoom(), 9.0);
}

#[test]
fn title_uses_active_view_center() {
    let mut cfg = small();
    cfg.x = 0.285;
    cfg.y = -0.01;
    assert_eq!(cfg.title(), "Fractal cartesian coordinates: (0.2850 , -0.0100)");

    cfg.use_julia = true;
    cfg.julia_x = 1.5;
    cfg.julia_y = 0.0;
    assert_eq!(cfg.title(), "Fractal cartesian coordinates: (1.5000 , 0.0000)");
}

#[test]
fn json_missing_fields_take_defaults() {
    let cfg: FractalConfig =
        serde_json::from_str(r#"{ "x": 0.285, "width": 64, "height": 64 }"#).unwrap();
    assert_eq!(cfg.x, 0.285);
    assert_eq!(cfg.width, 64);
    assert_eq!(cfg.max_iterations, FractalConfig::default().max_iterations);
    assert!(!cfg.use_julia);
}

#[test]
fn from_path_rejects_invalid_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cfg.json");
    std::fs::write(&path, r#"{ "width": 0 }"#).unwrap();
    assert!(matches!(
        FractalConfig::from_path(&path),
        Err(FractalError::InvalidArgs(_))
    ));

    std::fs::write(&path, "not json").unwrap();
    assert!(matches!(
        FractalConfig::from_path(&path),
        Err(FractalError::Other(_))
    ));
}

#[test]
fn video_params_validation() {
    VideoParams::new(1.0, 1.02, 30).validate().unwrap();
    assert!(VideoParams::new(1.0, 1.02, 0).validate().is_err());
    assert!(VideoParams::new(0.0, 1.02, 30).validate().is_err());
    assert!(VideoParams::new(1.0, f64::INFINITY, 30).validate().is_err());
    assert!(
        VideoParams::new(1.0, 1.02, 30)
            .with_frame_limit(0)
            .validate()
            .is_err()
    );
}

#[test]
fn video_zoom_start_is_twice_the_still_zoom_unit() {
    assert_eq!(VideoParams::new(0.8, 1.02, 30).first_frame_zoom(), 1.6);
    assert_eq!(VideoParams::new(1.0, 1.02, 30).first_frame_zoom(), 2.0);
}
