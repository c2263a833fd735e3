use std::fs;

use jms2scene::options::{load_import_settings, save_import_settings};
use jms2scene::region::Selection;
use jms2scene::{
    ImportError, ImportOptions, JmsModel, QuaternionConvention, ScalePreset, import_model,
    import_model_document,
};
use nalgebra::Vector3;
use tempfile::tempdir;

const MODEL_JSON: &str = r#"{
    "version": "8200",
    "nodes": [
        { "name": "frame root", "parent_index": -1, "translation": [0.0, 0.0, 0.0] },
        { "name": "frame a", "parent_index": 0, "translation": [2.0, 0.0, 0.0] },
        { "name": "frame b", "parent_index": 1, "translation": [0.0, 1.0, 0.0] }
    ],
    "markers": [
        { "name": "tip", "parent_index": 2, "region": 0, "translation": [0.0, 0.0, 1.0], "radius": 0.5 }
    ],
    "regions": ["body"],
    "permutations": ["base"],
    "vertices": [
        { "position": [0.0, 0.0, 0.0], "normal": [0.0, 0.0, 1.0], "uv": [0.0, 0.0], "bone_0": 0 },
        { "position": [9.0, 9.0, 9.0], "normal": [0.0, 0.0, 1.0] },
        { "position": [1.0, 0.0, 0.0], "normal": [0.0, 0.0, 1.0], "uv": [1.0, 0.0], "bone_0": 1, "bone_1": 2, "bone_1_weight": 0.25 },
        { "position": [0.0, 1.0, 0.0], "normal": [0.0, 0.0, 1.0], "uv": [0.0, 1.0] }
    ],
    "triangles": [
        { "vertices": [0, 2, 3], "region": 0 }
    ]
}"#;

fn identity_options() -> ImportOptions {
    ImportOptions {
        scale: ScalePreset::Identity,
        ..ImportOptions::default()
    }
}

#[test]
fn given_model_document_when_importing_then_scene_and_report_are_complete() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("model.json");
    fs::write(&path, MODEL_JSON).expect("write model");

    let (scene, report) = import_model_document(&path, &identity_options()).expect("import");

    let bones = &scene.armature.as_ref().expect("armature").bones;
    let expected = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 1.0, 0.0]];
    for (bone, expected) in bones.iter().zip(expected) {
        assert!((bone.transform.translation - Vector3::from(expected)).norm() < 1e-5);
    }

    assert_eq!(report.source_vertices, 4);
    assert_eq!(report.imported_vertices, 3);
    assert_eq!(report.imported_triangles, 1);
    assert_eq!(report.marker_count, 1);

    let mesh = &scene.meshes[0];
    assert_eq!(mesh.mesh.source_indices, vec![0, 2, 3]);
    assert_eq!(mesh.loops.uvs, vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]);
    assert!((mesh.weights.total_weight(1) - 1.0).abs() < 1e-6);
    assert_eq!(mesh.weights.total_weight(2), 0.0);

    let marker = &scene.markers[0];
    assert!((marker.absolute.translation - Vector3::new(2.0, 1.0, 1.0)).norm() < 1e-5);
}

#[test]
fn given_scene_when_serializing_then_json_is_produced() {
    let model: JmsModel = serde_json::from_str(MODEL_JSON).expect("parse model");
    let scene = import_model(&model, &identity_options()).expect("import");

    let json = serde_json::to_string(&scene).expect("serialize scene");

    assert!(json.contains("\"@frame root\""));
    assert!(json.contains("\"#tip\""));
}

#[test]
fn given_invalid_weight_in_document_when_importing_then_whole_import_fails() {
    let mut model: JmsModel = serde_json::from_str(MODEL_JSON).expect("parse model");
    model.vertices[2].bone_1_weight = -0.5;

    let err = import_model(&model, &identity_options()).unwrap_err();

    assert!(matches!(err, ImportError::InvalidWeight { vertex: 2, .. }));
}

#[test]
fn given_missing_document_when_importing_then_path_is_in_error() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("missing.json");

    let err = import_model_document(&path, &identity_options()).unwrap_err();

    assert!(format!("{err:#}").contains("missing.json"));
}

#[test]
fn given_settings_when_saved_and_loaded_then_they_round_trip() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("settings.json");
    let options = ImportOptions {
        scale: ScalePreset::Custom(12.5),
        quaternion_convention: QuaternionConvention::AsIs,
        import_radius: true,
        selection: Selection {
            regions: vec![0, 2],
            permutations: vec![1],
        },
        ..ImportOptions::default()
    };

    save_import_settings(&path, &options).expect("save settings");
    let loaded = load_import_settings(&path).expect("load settings");

    assert_eq!(loaded, options);
}
