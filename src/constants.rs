pub const RECIPE_COUNT_PER_PAGE: i64 = 10;
pub const INGREDIENT_COUNT_PER_PAGE: i64 = 10;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 1500;

pub const MIN_INGREDIENT_AMOUNT: i32 = 1;
pub const MAX_INGREDIENT_AMOUNT: i32 = 10000;

pub const RECIPE_NAME_MAX_LENGTH: usize = 200;
pub const TAG_NAME_MAX_LENGTH: usize = 200;
pub const TAG_SLUG_MAX_LENGTH: usize = 200;
pub const INGREDIENT_NAME_MAX_LENGTH: usize = 200;
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const EMAIL_MAX_LENGTH: usize = 254;
