//! Focused unit tests covering argument validation and command wiring.

use super::helpers::{Sandbox, feature_names};
use super::*;
use crate::import::{ImportRoutesArgs, ImportRoutesConfig};
use crate::seed::{AddAmenityArgs, AddAmenityConfig, AddAreaArgs, AddAreaConfig};
use lbs_core::{Category, EntityError, GeometryError, QueryError, QueryErrorKind};
use rstest::rstest;

fn complete_amenity() -> AddAmenityArgs {
    AddAmenityArgs {
        name: Some("Brew Lab".to_owned()),
        category: Some("cafe".to_owned()),
        lat: Some(53.35),
        lng: Some(-6.26),
        ..AddAmenityArgs::default()
    }
}

#[rstest]
#[case::name(AddAmenityArgs { name: None, ..complete_amenity() }, ARG_NAME, ENV_AMENITY_NAME)]
#[case::category(
    AddAmenityArgs { category: None, ..complete_amenity() },
    ARG_CATEGORY,
    ENV_AMENITY_CATEGORY
)]
#[case::lat(AddAmenityArgs { lat: None, ..complete_amenity() }, ARG_LAT, ENV_AMENITY_LAT)]
#[case::lng(AddAmenityArgs { lng: None, ..complete_amenity() }, ARG_LNG, ENV_AMENITY_LNG)]
fn add_amenity_requires_every_field(
    #[case] args: AddAmenityArgs,
    #[case] field: &'static str,
    #[case] env_var: &'static str,
) {
    let err = AddAmenityConfig::try_from(args).expect_err("missing field should error");
    match err {
        CliError::MissingArgument {
            field: missing,
            env,
        } => {
            assert_eq!(missing, field);
            assert_eq!(env, env_var);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn add_amenity_builds_a_validated_draft() {
    let args = AddAmenityArgs {
        category: Some("GYM".to_owned()),
        description: Some("Open late".to_owned()),
        ..complete_amenity()
    };
    let config = AddAmenityConfig::try_from(args).expect("valid amenity");
    assert_eq!(config.draft.category, Category::Gym);
    assert_eq!(config.draft.description, "Open late");
    assert_eq!(config.database, Utf8PathBuf::from(DEFAULT_DATABASE));
}

#[rstest]
fn add_amenity_rejects_unknown_categories() {
    let args = AddAmenityArgs {
        category: Some("library".to_owned()),
        ..complete_amenity()
    };
    match AddAmenityConfig::try_from(args) {
        Err(CliError::Category(err)) => assert_eq!(err.0, "library"),
        other => panic!("expected a category error, found {other:?}"),
    }
}

#[rstest]
fn add_amenity_rejects_positions_off_the_globe() {
    let args = AddAmenityArgs {
        lat: Some(91.0),
        ..complete_amenity()
    };
    match AddAmenityConfig::try_from(args) {
        Err(CliError::Entity(EntityError::Geometry(GeometryError::InvalidPosition { .. }))) => {}
        other => panic!("expected an invalid position, found {other:?}"),
    }
}

#[rstest]
fn add_area_requires_a_boundary() {
    let args = AddAreaArgs {
        name: Some("City Centre".to_owned()),
        ..AddAreaArgs::default()
    };
    match AddAreaConfig::try_from(args) {
        Err(CliError::MissingArgument { field, env }) => {
            assert_eq!(field, ARG_BOUNDARY);
            assert_eq!(env, ENV_AREA_BOUNDARY);
        }
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

#[rstest]
fn import_config_defaults_to_the_working_directory() {
    let config = ImportRoutesConfig::from(ImportRoutesArgs::default());
    assert_eq!(config.layout.base_dir, Utf8PathBuf::from("."));
    assert_eq!(config.layout.data_dir, Utf8PathBuf::from("./data"));
    assert_eq!(config.database, Utf8PathBuf::from(DEFAULT_DATABASE));
    assert!(!config.options.reset);
}

#[rstest]
fn import_config_honours_an_explicit_data_dir() {
    let args = ImportRoutesArgs {
        base_dir: Some(Utf8PathBuf::from("/srv/lbs")),
        data_dir: Some(Utf8PathBuf::from("/var/lib/routes")),
        reset: true,
        ..ImportRoutesArgs::default()
    };
    let config = ImportRoutesConfig::from(args);
    assert_eq!(config.layout.base_dir, Utf8PathBuf::from("/srv/lbs"));
    assert_eq!(config.layout.data_dir, Utf8PathBuf::from("/var/lib/routes"));
    assert!(config.options.reset);
}

#[rstest]
fn unknown_subcommands_fail_argument_parsing() {
    let mut output = Vec::new();
    let err = run_with(["lbs", "teleport"], &mut output).expect_err("unknown command");
    assert!(matches!(err, CliError::ArgumentParsing(_)));
    assert!(output.is_empty());
}

#[rstest]
fn nearest_requires_a_latitude() {
    let sandbox = Sandbox::new();
    let (result, _) = sandbox.run(&["nearest", "--lng", "-6.26"]);
    match result {
        Err(CliError::Query(QueryError::MissingParam { name })) => assert_eq!(name, "lat"),
        other => panic!("expected a missing lat, found {other:?}"),
    }
}

#[rstest]
fn unknown_areas_are_reported_as_not_found() {
    let sandbox = Sandbox::new();
    let (result, output) = sandbox.run(&["within", "--area-id", "999"]);
    match result {
        Err(CliError::Query(err)) => assert_eq!(err.kind(), QueryErrorKind::NotFound),
        other => panic!("expected a query error, found {other:?}"),
    }
    assert!(output.is_empty());
}

#[rstest]
fn list_amenities_filters_by_category() {
    let sandbox = Sandbox::new();
    sandbox.seed_city_centre();
    let (result, output) = sandbox.run(&["list-amenities", "--category", "cafe"]);
    result.expect("list-amenities should succeed");
    assert_eq!(feature_names(&output), ["Brew Lab", "Far Cafe"]);
}

#[rstest]
fn list_amenities_searches_names() {
    let sandbox = Sandbox::new();
    sandbox.seed_city_centre();
    let (result, output) = sandbox.run(&["list-amenities", "--search", "hub"]);
    result.expect("list-amenities should succeed");
    assert_eq!(feature_names(&output), ["Lift Hub"]);
}

#[rstest]
fn add_area_rejects_non_polygon_files() {
    let sandbox = Sandbox::new();
    let path = sandbox.root.join("point.geojson");
    std::fs::write(&path, r#"{"type":"Point","coordinates":[-6.26,53.35]}"#)
        .expect("write point");
    let (result, _) = sandbox.run(&["add-area", "--name", "Dot", "--boundary", path.as_str()]);
    match result {
        Err(CliError::ParseBoundary { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected a boundary parse error, found {other:?}"),
    }
}

#[rstest]
fn add_area_reports_missing_boundary_files() {
    let sandbox = Sandbox::new();
    let path = sandbox.root.join("absent.geojson");
    let (result, _) = sandbox.run(&["add-area", "--name", "Ghost", "--boundary", path.as_str()]);
    assert!(matches!(result, Err(CliError::ReadBoundary { .. })));
}
