//! Parsing of the physics JSON files: the physics manager configuration and
//! the per-object `.phys_properties.json` files.
//!
//! Both are read as a `serde_json::Value` and applied field by field. A
//! wrongly typed field is logged with its name and leaves the default value.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;
use ultraviolet::Vec3;

use crate::{
    attributes::{PhysicsManagerAttributes, PhysicsObjectAttributes, TemplateOrigin},
    error::AssetError,
};

pub const OBJECT_CONFIG_SUFFIX: &str = ".phys_properties.json";

pub fn read_json(path: &Path) -> Result<Value, AssetError> {
    let text = fs::read_to_string(path).map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            AssetError::not_found("file", path.display())
        } else {
            AssetError::ParseFailure {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        }
    })?;
    serde_json::from_str(&text).map_err(|err| AssetError::ParseFailure {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

/// Reads a physics manager configuration. `"rigid object paths"` entries are
/// resolved against the configuration's directory and expanded with
/// [`build_object_config_paths`].
pub fn parse_physics_manager_attributes(
    path: &Path,
) -> Result<PhysicsManagerAttributes, AssetError> {
    let json = read_json(path)?;
    let mut attributes = PhysicsManagerAttributes::new(path.to_string_lossy());
    let fields = JsonFields::new(&json, path);

    fields.string("physics simulator", &mut attributes.simulator);
    fields.number("timestep", &mut attributes.timestep);
    if !fields.number("friction coefficient", &mut attributes.friction_coefficient) {
        log::error!("{:?}: missing or invalid friction coefficient", path);
    }
    if !fields.number(
        "restitution coefficient",
        &mut attributes.restitution_coefficient,
    ) {
        log::error!("{:?}: missing or invalid restitution coefficient", path);
    }
    fields.vec3("gravity", &mut attributes.gravity);

    let Some(paths) = json.get("rigid object paths").and_then(Value::as_array) else {
        return Ok(attributes);
    };
    let directory = path.parent().unwrap_or_else(|| Path::new(""));
    for (i, entry) in paths.iter().enumerate() {
        match entry.as_str() {
            Some(relative) => attributes
                .object_library_paths
                .extend(build_object_config_paths(&directory.join(relative))),
            None => log::error!("{:?}: invalid entry {} in rigid object paths", path, i),
        }
    }
    Ok(attributes)
}

/// Reads an object template file. Mesh paths are relative to the file.
pub fn parse_object_attributes(path: &Path) -> Result<PhysicsObjectAttributes, AssetError> {
    let json = read_json(path)?;
    let mut attributes =
        PhysicsObjectAttributes::new(path.to_string_lossy(), TemplateOrigin::File);
    let fields = JsonFields::new(&json, path);

    fields.number("mass", &mut attributes.mass);
    fields.bool(
        "use bounding box for collision",
        &mut attributes.bounding_box_collisions,
    );
    if fields.vec3("COM", &mut attributes.com) {
        attributes.com_provided = true;
    }
    fields.vec3("scale", &mut attributes.scale);
    fields.vec3("inertia", &mut attributes.inertia);
    fields.number("friction coefficient", &mut attributes.friction_coefficient);
    fields.number(
        "restitution coefficient",
        &mut attributes.restitution_coefficient,
    );
    fields.bool("join collision meshes", &mut attributes.join_collision_meshes);
    fields.bool("requires lighting", &mut attributes.requires_lighting);

    let directory = path.parent().unwrap_or_else(|| Path::new(""));
    let mesh_path = |key: &str| {
        let mut relative = String::new();
        if fields.string(key, &mut relative) {
            directory.join(relative).to_string_lossy().into_owned()
        } else {
            String::new()
        }
    };
    attributes.render_asset_handle = mesh_path("render mesh");
    attributes.collision_asset_handle = mesh_path("collision mesh");
    Ok(attributes)
}

/// Object template files for `path`: `path` itself (or `path` plus the
/// config suffix) when it exists, then every config file in the directory
/// `path`, sorted by name.
pub fn build_object_config_paths(path: &Path) -> Vec<PathBuf> {
    let as_string = path.to_string_lossy();
    let config_file = if as_string.ends_with(OBJECT_CONFIG_SUFFIX) {
        path.to_path_buf()
    } else {
        PathBuf::from(format!("{}{}", as_string, OBJECT_CONFIG_SUFFIX))
    };
    let is_dir = path.is_dir();
    let file_exists = config_file.exists();
    if !is_dir && !file_exists {
        log::warn!("Cannot find {:?} or {:?}", path, config_file);
        return Vec::new();
    }

    let mut paths = Vec::new();
    if file_exists {
        paths.push(config_file);
    }
    if is_dir {
        log::info!("Parsing object library directory {:?}", path);
        match fs::read_dir(path) {
            Ok(entries) => {
                let mut found: Vec<PathBuf> = entries
                    .filter_map(|entry| entry.ok().map(|e| e.path()))
                    .filter(|p| p.to_string_lossy().ends_with(OBJECT_CONFIG_SUFFIX))
                    .collect();
                found.sort();
                paths.extend(found);
            }
            Err(err) => log::error!("Failed to list {:?}: {}", path, err),
        }
    }
    paths
}

/// Typed field access which logs wrongly typed fields. Every setter returns
/// whether the field was present and applied.
struct JsonFields<'a> {
    json: &'a Value,
    path: &'a Path,
}

impl<'a> JsonFields<'a> {
    fn new(json: &'a Value, path: &'a Path) -> Self {
        Self { json, path }
    }

    fn field(&self, key: &str) -> Option<&'a Value> {
        self.json.get(key)
    }

    fn invalid(&self, key: &str) -> bool {
        log::error!("{:?}: invalid value for {:?}", self.path, key);
        false
    }

    fn number(&self, key: &str, target: &mut f64) -> bool {
        match self.field(key) {
            None => false,
            Some(value) => match value.as_f64() {
                Some(number) => {
                    *target = number;
                    true
                }
                None => self.invalid(key),
            },
        }
    }

    fn bool(&self, key: &str, target: &mut bool) -> bool {
        match self.field(key) {
            None => false,
            Some(Value::Bool(value)) => {
                *target = *value;
                true
            }
            Some(_) => self.invalid(key),
        }
    }

    fn string(&self, key: &str, target: &mut String) -> bool {
        match self.field(key) {
            None => false,
            Some(Value::String(value)) => {
                *target = value.clone();
                true
            }
            Some(_) => self.invalid(key),
        }
    }

    /// Components after the first non-number keep their previous value.
    fn vec3(&self, key: &str, target: &mut Vec3) -> bool {
        match self.field(key) {
            None => false,
            Some(Value::Array(values)) => {
                let mut components = [target.x, target.y, target.z];
                for (i, value) in values.iter().take(3).enumerate() {
                    match value.as_f64() {
                        Some(number) => components[i] = number as f32,
                        None => {
                            log::error!("{:?}: invalid value in {:?} array", self.path, key);
                            break;
                        }
                    }
                }
                *target = Vec3::from(components);
                true
            }
            Some(_) => self.invalid(key),
        }
    }
}
