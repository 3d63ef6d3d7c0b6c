use std::fs;
use thinner_cli::pak::{self, BuildArgs, CreateArgs, ExtractArgs, ListArgs, PakCommand};
use thinner_cli::pak::ConvertArgs as PakConvertArgs;
use thinner_cli::scene::{self, ConvertArgs, InfoArgs, SceneCommand};
use thinner_cli::manifest_file;
use thinner_config::{SceneFormat, ToolConfig};
use thinner_core::{Endian, Id};
use thinner_packfile::{ManifestFormat, Packfile, VirtualFile};
use thinner_scene::{Component, Entity, Point3, Property, SceneFile, SceneVersion, Value};

fn sample_scene() -> SceneFile {
    let mut component = Component::new("JPSTransformationComponent", Id::from(2u32));
    component.properties.push(Property::scalar(
        "Translation",
        Value::Point3(Point3::new(1.0, 2.0, 3.0)),
    ));
    let mut entity = Entity::new("Root", Id::from(1u32));
    entity.components.push(component);

    let mut file = SceneFile::new(SceneVersion::V2);
    file.objects.entities.push(entity);
    file.scene.referenced_entities.push(Id::from(1u32));
    file
}

fn sample_pak() -> Packfile {
    Packfile::with_files(vec![
        VirtualFile::from_path_and_data(
            "levels/town.bin",
            sample_scene().encode(Endian::Big).unwrap(),
        ),
        VirtualFile::from_path_and_data("scripts/main.lua", b"print('hi')\n".to_vec()),
        VirtualFile::from_path_and_data("garbage.bin", vec![0xEE; 3]),
    ])
}

#[test]
fn extract_then_build_uses_scene_sidecars() {
    let dir = tempfile::tempdir().unwrap();
    let pak_path = dir.path().join("game.pak");
    fs::write(&pak_path, sample_pak().encode(Endian::Big).unwrap()).unwrap();

    let out = dir.path().join("out");
    let config = ToolConfig::default();
    pak::execute(
        PakCommand::Extract(ExtractArgs {
            pak: pak_path.clone(),
            dir: out.clone(),
            manifest_format: None,
        }),
        &config,
    )
    .unwrap();

    assert!(out.join("manifest.json").is_file());
    assert_eq!(fs::read(out.join("scripts/main.lua")).unwrap(), b"print('hi')\n");
    let sidecar = out.join("levels/town.bin.xml");
    assert!(sidecar.is_file());
    // not a scene, so no sidecar
    assert!(!out.join("garbage.bin.xml").exists());

    // edit the XML; the rebuilt packfile must carry the edit
    let xml = fs::read_to_string(&sidecar).unwrap().replace("Root", "Renamed");
    fs::write(&sidecar, xml).unwrap();

    let rebuilt = dir.path().join("rebuilt.pak");
    pak::execute(
        PakCommand::Build(BuildArgs {
            manifest: out.join(manifest_file(ManifestFormat::Json)),
            dir: out.clone(),
            out: rebuilt.clone(),
            manifest_format: None,
        }),
        &config,
    )
    .unwrap();

    let pak = Packfile::decode(&fs::read(&rebuilt).unwrap()).unwrap();
    assert_eq!(pak.paths(), vec!["levels/town.bin", "scripts/main.lua", "garbage.bin"]);
    let scene_bytes = &pak.get_file_from_path("levels/town.bin").unwrap().data;
    let scene = SceneFile::decode(scene_bytes, Endian::Big).unwrap();
    assert_eq!(scene.objects.entities[0].name, "Renamed");
    assert_eq!(pak.get_file_from_path("garbage.bin").unwrap().data, vec![0xEE; 3]);

    pak::execute(PakCommand::List(ListArgs { pak: rebuilt }), &config).unwrap();
}

#[test]
fn extract_without_conversion_writes_raw_payloads_only() {
    let dir = tempfile::tempdir().unwrap();
    let pak_path = dir.path().join("game.pak");
    fs::write(&pak_path, sample_pak().encode(Endian::Little).unwrap()).unwrap();

    let config = ToolConfig {
        convert_scenes: false,
        ..ToolConfig::default()
    };
    let out = dir.path().join("out");
    pak::execute(
        PakCommand::Extract(ExtractArgs {
            pak: pak_path,
            dir: out.clone(),
            manifest_format: None,
        }),
        &config,
    )
    .unwrap();

    assert!(out.join("levels/town.bin").is_file());
    assert!(!out.join("levels/town.bin.xml").exists());
    assert!(!out.join("levels/town.bin.json").exists());
}

#[test]
fn xml_manifest_extract_then_build() {
    let dir = tempfile::tempdir().unwrap();
    let pak_path = dir.path().join("game.pak");
    let original = sample_pak();
    fs::write(&pak_path, original.encode(Endian::Big).unwrap()).unwrap();

    let config = ToolConfig {
        convert_scenes: false,
        ..ToolConfig::default()
    };
    let out = dir.path().join("out");
    pak::execute(
        PakCommand::Extract(ExtractArgs {
            pak: pak_path,
            dir: out.clone(),
            manifest_format: Some(ManifestFormat::Xml),
        }),
        &config,
    )
    .unwrap();

    let manifest = out.join("manifest.xml");
    assert!(fs::read_to_string(&manifest).unwrap().contains("<PackfileStripped"));
    assert!(!out.join("manifest.json").exists());

    // the format follows the manifest's extension
    let rebuilt = dir.path().join("rebuilt.pak");
    pak::execute(
        PakCommand::Build(BuildArgs {
            manifest,
            dir: out,
            out: rebuilt.clone(),
            manifest_format: None,
        }),
        &config,
    )
    .unwrap();

    let pak = Packfile::decode(&fs::read(&rebuilt).unwrap()).unwrap();
    assert_eq!(pak, original);
}

#[test]
fn pak_convert_through_documents() {
    let dir = tempfile::tempdir().unwrap();
    let pak_path = dir.path().join("game.pak");
    let original = sample_pak();
    fs::write(&pak_path, original.encode(Endian::Big).unwrap()).unwrap();

    let xml = dir.path().join("game.xml");
    let json = dir.path().join("game.json");
    let back = dir.path().join("back.pak");
    let config = ToolConfig::default();

    for (input, output) in [(&pak_path, &xml), (&xml, &json), (&json, &back)] {
        pak::execute(
            PakCommand::Convert(PakConvertArgs {
                input: input.clone(),
                output: output.clone(),
            }),
            &config,
        )
        .unwrap();
    }

    assert!(fs::read_to_string(&xml).unwrap().contains("<Packfile version=\"2\">"));
    assert_eq!(Packfile::decode(&fs::read(&back).unwrap()).unwrap(), original);
    assert_eq!(fs::read(&back).unwrap(), fs::read(&pak_path).unwrap());
}

#[test]
fn create_packs_a_directory_in_sorted_order() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    fs::create_dir_all(src.join("models")).unwrap();
    fs::write(src.join("b.lua"), "x = 1\n".repeat(50)).unwrap();
    fs::write(src.join("models/a.nif"), [1u8, 2, 3]).unwrap();

    let config = ToolConfig {
        compression_level: 9,
        endian: Endian::Little,
        ..ToolConfig::default()
    };
    let out = dir.path().join("new.pak");
    pak::execute(
        PakCommand::Create(CreateArgs {
            dir: src,
            out: out.clone(),
        }),
        &config,
    )
    .unwrap();

    let pak = Packfile::decode(&fs::read(&out).unwrap()).unwrap();
    assert_eq!(pak.paths(), vec!["b.lua", "models/a.nif"]);
    assert!(pak.files[0].compress);
    assert_eq!(pak.files[1].type_tag.as_str(), "NIF");
}

#[test]
fn scene_convert_between_all_forms() {
    let dir = tempfile::tempdir().unwrap();
    let binary = dir.path().join("scene.bin");
    fs::write(&binary, sample_scene().encode(Endian::Little).unwrap()).unwrap();

    let config = ToolConfig {
        endian: Endian::Little,
        pretty: false,
        scene_format: SceneFormat::Json,
        ..ToolConfig::default()
    };
    let json = dir.path().join("scene.json");
    let xml = dir.path().join("scene.xml");
    let back = dir.path().join("back.bin");

    for (input, output) in [(&binary, &json), (&json, &xml), (&xml, &back)] {
        scene::execute(
            SceneCommand::Convert(ConvertArgs {
                input: input.clone(),
                output: output.clone(),
                designer: false,
            }),
            &config,
        )
        .unwrap();
    }

    assert_eq!(fs::read(&back).unwrap(), fs::read(&binary).unwrap());
    assert!(fs::read_to_string(&xml).unwrap().contains("<GSA"));
    scene::execute(SceneCommand::Info(InfoArgs { input: xml }), &config).unwrap();
}

#[test]
fn scene_convert_reports_bad_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.xml");
    fs::write(&input, "<GSA Version=\"7\"/>").unwrap();

    let err = scene::execute(
        SceneCommand::Convert(ConvertArgs {
            input,
            output: dir.path().join("out.bin"),
            designer: false,
        }),
        &ToolConfig::default(),
    )
    .unwrap_err();
    assert!(format!("{:#}", err).contains("broken.xml"));
}

#[test]
fn scene_input_form_is_sniffed_without_a_known_extension() {
    let dir = tempfile::tempdir().unwrap();
    let config = ToolConfig::default();
    let scene = sample_scene();

    // XML saved under the packfile's .bin name
    let disguised = dir.path().join("town.bin");
    fs::write(&disguised, scene.to_xml(true).unwrap()).unwrap();
    let binary = dir.path().join("town.out");
    scene::execute(
        SceneCommand::Convert(ConvertArgs {
            input: disguised,
            output: binary.clone(),
            designer: false,
        }),
        &config,
    )
    .unwrap();

    let decoded = SceneFile::decode(&fs::read(&binary).unwrap(), Endian::Big).unwrap();
    assert_eq!(decoded, scene);
}

#[test]
fn scene_convert_designer_export() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("town.bin");
    fs::write(&input, sample_scene().encode(Endian::Big).unwrap()).unwrap();
    let config = ToolConfig::default();

    let output = dir.path().join("town.designer.xml");
    scene::execute(
        SceneCommand::Convert(ConvertArgs {
            input: input.clone(),
            output: output.clone(),
            designer: true,
        }),
        &config,
    )
    .unwrap();
    let xml = fs::read_to_string(&output).unwrap();
    assert!(xml.contains(r#"Class="NiTransformationComponent""#));
    assert!(xml.contains(r#"<COMPONENT RefLinkID="00,00,00,00,00,00,00,00,00,00,00,00,00,00,00,02"/>"#));

    let err = scene::execute(
        SceneCommand::Convert(ConvertArgs {
            input,
            output: dir.path().join("town.json"),
            designer: true,
        }),
        &config,
    )
    .unwrap_err();
    assert!(err.to_string().contains(".xml"));
}
