mod helpers;
mod test_health_check;
