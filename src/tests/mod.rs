mod alias;
mod cooked;
mod key;
