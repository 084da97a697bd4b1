mod helpers;
mod recipe;
mod settings;
mod shop;
mod watch;

pub(crate) use recipe::{
    cmd_recipe_add, cmd_recipe_delete, cmd_recipe_edit, cmd_recipe_list, cmd_recipe_show,
    cmd_search, cmd_seed, cmd_toggle_ingredient,
};
pub(crate) use settings::{cmd_config_get, cmd_config_set};
pub(crate) use shop::{
    cmd_shop_add, cmd_shop_clear, cmd_shop_delete, cmd_shop_list, cmd_shop_reset, cmd_shop_toggle,
};
pub(crate) use watch::cmd_watch;
