//! # CubeRunner
//!
//! Players walk a bounded grid and collide with walls.
//!
//! Module state: `width`, `height` and `walls`, a map from `"x,y"` to a wall
//! count (a cell is a wall while its count is positive). User state: `x`,
//! `y`. Every player starts at the origin, so the origin can never hold a
//! wall.
//!
//! `move` takes unit offsets (`xOffset`, `yOffset` in `-1..=1`); `teleport`
//! takes arbitrary offsets `x`, `y`. Both are no-ops when the destination
//! is outside the grid, is a wall, or equals the current position.

use sd_01_state_store::ModuleView;
use sd_02_execution_context::{ChangeContext, Container};
use sd_03_module_registry::{required_str, GetterError, ModuleDefinition};
use serde_json::{json, Map, Value};
use shared_types::{Amount, Args, UserId};

pub const CUBE_RUNNER_MODULE: &str = "CubeRunner";
pub const CUBE_RUNNER_VERSION: &str = "1";
pub const DEFAULT_WORLD_SIZE: i64 = 64;

const WALLS: &str = "walls";

pub fn cube_runner_module() -> ModuleDefinition {
    ModuleDefinition::new(CUBE_RUNNER_MODULE, CUBE_RUNNER_VERSION)
        .with_module_state(json!({
            "walls": {},
            "width": DEFAULT_WORLD_SIZE,
            "height": DEFAULT_WORLD_SIZE,
        }))
        .with_user_state(json!({"x": 0, "y": 0}))
        .with_handler("move", move_player)
        .with_handler("teleport", teleport)
        .with_handler("placeWall", place_wall)
        .with_handler("removeWall", remove_wall)
        .with_getter("getAllPositions", get_all_positions)
        .with_getter("getAllWalls", get_all_walls)
        .with_getter("getPosition", get_position)
}

/// Key of a cell in the `walls` map.
pub fn wall_key(x: i64, y: i64) -> String {
    format!("{x},{y}")
}

fn parse_wall_key(key: &str) -> Option<(i64, i64)> {
    let (x, y) = key.split_once(',')?;
    Some((x.parse().ok()?, y.parse().ok()?))
}

// =============================================================================
// HANDLERS
// =============================================================================

fn in_world(container: &Container, x: i64, y: i64) -> bool {
    (0..container.module_i64("width")).contains(&x) && (0..container.module_i64("height")).contains(&y)
}

fn is_wall(container: &Container, x: i64, y: i64) -> bool {
    container.module_nested_i64(WALLS, &wall_key(x, y)) > 0
}

/// Record a signed change of one coordinate.
fn shift(ctx: &mut ChangeContext, user: &UserId, axis: &str, offset: Amount) {
    if offset > 0 {
        ctx.add(user, axis, offset);
    } else if offset < 0 {
        ctx.subtract(user, axis, -offset);
    }
}

fn relocate(container: &Container, mut ctx: ChangeContext, dx: i64, dy: i64) -> ChangeContext {
    if dx == 0 && dy == 0 {
        return ctx;
    }
    let player = container.sender();
    let x = container.user_i64(player, "x");
    let y = container.user_i64(player, "y");
    let (Some(nx), Some(ny)) = (x.checked_add(dx), y.checked_add(dy)) else {
        return ctx;
    };

    if in_world(container, nx, ny) && !is_wall(container, nx, ny) {
        shift(&mut ctx, player, "x", dx);
        shift(&mut ctx, player, "y", dy);
    }
    ctx
}

fn move_player(container: &Container, ctx: ChangeContext) -> ChangeContext {
    let (Some(dx), Some(dy)) = (container.arg_i64("xOffset"), container.arg_i64("yOffset")) else {
        return ctx;
    };
    if !(-1..=1).contains(&dx) || !(-1..=1).contains(&dy) {
        return ctx;
    }
    relocate(container, ctx, dx, dy)
}

fn teleport(container: &Container, ctx: ChangeContext) -> ChangeContext {
    match (container.arg_i64("x"), container.arg_i64("y")) {
        (Some(dx), Some(dy)) => relocate(container, ctx, dx, dy),
        _ => ctx,
    }
}

fn occupied(container: &Container, x: i64, y: i64) -> bool {
    (x == 0 && y == 0)
        || container.users().any(|(_, record)| {
            record.get("x").and_then(Value::as_i64) == Some(x)
                && record.get("y").and_then(Value::as_i64) == Some(y)
        })
}

fn place_wall(container: &Container, mut ctx: ChangeContext) -> ChangeContext {
    let (Some(x), Some(y)) = (container.arg_i64("x"), container.arg_i64("y")) else {
        return ctx;
    };
    if in_world(container, x, y) && !is_wall(container, x, y) && !occupied(container, x, y) {
        ctx.add_module_nested(WALLS, &wall_key(x, y), 1);
    }
    ctx
}

fn remove_wall(container: &Container, mut ctx: ChangeContext) -> ChangeContext {
    let (Some(x), Some(y)) = (container.arg_i64("x"), container.arg_i64("y")) else {
        return ctx;
    };
    let count = container.module_nested_i64(WALLS, &wall_key(x, y));
    if count > 0 {
        ctx.subtract_module_nested(WALLS, &wall_key(x, y), count);
    }
    ctx
}

// =============================================================================
// GETTERS
// =============================================================================

fn position(record: &Value) -> Value {
    json!({
        "x": record.get("x").cloned().unwrap_or(json!(0)),
        "y": record.get("y").cloned().unwrap_or(json!(0)),
    })
}

/// `{userId: {x, y}}` for every player with a record.
fn get_all_positions(view: &ModuleView, _args: &Args) -> Result<Value, GetterError> {
    let positions: Map<String, Value> = view
        .users()
        .map(|(user, record)| (user.to_string(), position(record)))
        .collect();
    Ok(Value::Object(positions))
}

/// `{x: {y: true}}` for every wall.
fn get_all_walls(view: &ModuleView, _args: &Args) -> Result<Value, GetterError> {
    let mut walls = Map::new();
    let cells = view
        .module_state()
        .get(WALLS)
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
        .filter(|(_, count)| count.as_i64().unwrap_or(0) > 0)
        .filter_map(|(key, _)| parse_wall_key(key));

    for (x, y) in cells {
        let column = walls
            .entry(x.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(column) = column.as_object_mut() {
            column.insert(y.to_string(), Value::Bool(true));
        }
    }
    Ok(Value::Object(walls))
}

fn get_position(view: &ModuleView, args: &Args) -> Result<Value, GetterError> {
    let user = UserId::from(required_str(args, "user")?);
    Ok(position(&view.user(&user)))
}
