//! House layout files: `<base>/house/<house id>/house.json`, referencing room
//! models under `<base>/room/<house id>/` and object models under
//! `<base>/object/<model id>/`.

use std::path::{Path, PathBuf};

use asset_common::{AssetInfo, AssetType};
use serde::Deserialize;
use ultraviolet::{Mat4, Vec4};

use crate::error::AssetError;

#[derive(Debug, Deserialize)]
pub struct HouseLayout {
    pub levels: Vec<HouseLevel>,
}

#[derive(Debug, Deserialize)]
pub struct HouseLevel {
    #[serde(default)]
    pub nodes: Vec<HouseNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default = "default_valid")]
    pub valid: i32,
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub hide_ceiling: i32,
    #[serde(default)]
    pub hide_floor: i32,
    #[serde(default)]
    pub hide_walls: i32,
    /// Column major model to scene matrix, only on `Object` nodes.
    #[serde(default)]
    pub transform: Option<Vec<f32>>,
}

fn default_valid() -> i32 {
    1
}

/// One scene node to create for a house. Nodes are created in order, their
/// position in the list is their semantic index.
#[derive(Debug, Clone, PartialEq)]
pub struct HouseNodePlan {
    pub id: String,
    /// `None` creates an empty node.
    pub asset: Option<AssetInfo>,
    pub transform: Option<Mat4>,
}

impl HouseLayout {
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let text = std::fs::read_to_string(path)
            .map_err(|_| AssetError::not_found("house file", path.display()))?;
        serde_json::from_str(&text).map_err(|err| AssetError::ParseFailure {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    /// The nodes of every level, skipping invalid ones.
    pub fn plan(&self, house_file: &Path) -> Result<Vec<HouseNodePlan>, AssetError> {
        let (base, house_id) = house_paths(house_file)?;
        let room_path = base.join("room").join(&house_id);
        let object_path = base.join("object");
        let house_object =
            |path: PathBuf| Some(AssetInfo::new(AssetType::HouseObject, path));

        let mut plans = Vec::new();
        for node in self.levels.iter().flat_map(|level| &level.nodes) {
            if node.valid == 0 {
                continue;
            }
            let room_base = |suffix: &str| room_path.join(format!("{}{}", node.model_id, suffix));
            match node.node_type.as_str() {
                "Room" => {
                    for (hidden, suffix) in [
                        (node.hide_ceiling, "c"),
                        (node.hide_walls, "w"),
                        (node.hide_floor, "f"),
                    ] {
                        if hidden != 1 {
                            plans.push(HouseNodePlan {
                                id: format!("{}{}", node.id, suffix),
                                asset: house_object(room_base(&format!("{}.glb", suffix))),
                                transform: None,
                            });
                        }
                    }
                }
                "Object" => plans.push(HouseNodePlan {
                    id: node.id.clone(),
                    asset: house_object(
                        object_path
                            .join(&node.model_id)
                            .join(format!("{}.glb", node.model_id)),
                    ),
                    transform: node.object_transform(),
                }),
                "Box" => plans.push(HouseNodePlan {
                    id: node.id.clone(),
                    asset: None,
                    transform: None,
                }),
                "Ground" => plans.push(HouseNodePlan {
                    id: node.id.clone(),
                    asset: house_object(room_base("f.glb")),
                    transform: None,
                }),
                other => log::error!("Unrecognized house node type {:?} in {:?}", other, house_file),
            }
        }
        Ok(plans)
    }
}

impl HouseNode {
    fn object_transform(&self) -> Option<Mat4> {
        let values = self.transform.as_ref()?;
        if values.len() != 16 {
            log::error!(
                "House node {} has a transform with {} values, expected 16",
                self.id,
                values.len()
            );
            return None;
        }
        let column = |i: usize| Vec4::new(values[i], values[i + 1], values[i + 2], values[i + 3]);
        Some(Mat4::new(column(0), column(4), column(8), column(12)))
    }
}

/// Splits `<base>/house/<house id>/house.json` into `<base>` and the house id.
fn house_paths(house_file: &Path) -> Result<(PathBuf, String), AssetError> {
    let parse_failure = || AssetError::ParseFailure {
        path: house_file.to_path_buf(),
        reason: "expected a path of the form <base>/house/<house id>/house.json".into(),
    };
    let house_dir = house_file.parent().ok_or_else(parse_failure)?;
    let house_id = house_dir
        .file_name()
        .ok_or_else(parse_failure)?
        .to_string_lossy()
        .into_owned();
    let base = house_dir
        .parent()
        .and_then(Path::parent)
        .ok_or_else(parse_failure)?;
    Ok((base.to_path_buf(), house_id))
}
